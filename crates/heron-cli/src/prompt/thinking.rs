use rand::seq::SliceRandom;

const MESSAGES: &[&str] = &[
    "Wading in",
    "Standing very still",
    "Scanning the shallows",
    "Stretching a wing",
    "Considering the reeds",
    "Eyeing the water",
    "Preening",
    "Taking flight",
];

pub fn get_random_thinking_message() -> &'static str {
    MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Thinking")
}
