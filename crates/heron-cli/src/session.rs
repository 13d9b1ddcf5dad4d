use anyhow::Result;
use futures::StreamExt;

use heron::agent::Agent;
use heron::models::message::Message;

use crate::prompt::{InputType, Prompt};

/// Drives one interactive run: alternates between reading user input and
/// streaming the agent's reply. History lives here and only ever grows;
/// nothing is persisted across runs.
pub struct Session {
    agent: Agent,
    prompt: Box<dyn Prompt>,
}

impl Session {
    pub fn new(agent: Agent, prompt: Box<dyn Prompt>) -> Self {
        Session { agent, prompt }
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt.agent_ready();

        let mut messages = Vec::new();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = &input.content {
                        messages.push(Message::user().with_text(content));
                    }
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }

            self.prompt.show_busy();
            let result = self.process_reply(&mut messages).await;
            self.prompt.hide_busy();
            // An inference failure is fatal to the run; surface it verbatim
            result?;
        }

        self.prompt.close();
        Ok(())
    }

    /// Send a single message and return once the reply round completes.
    pub async fn headless_start(&mut self, initial_message: &str) -> Result<()> {
        let mut messages = vec![Message::user().with_text(initial_message)];

        self.prompt.show_busy();
        let result = self.process_reply(&mut messages).await;
        self.prompt.hide_busy();
        result?;

        self.prompt.close();
        Ok(())
    }

    async fn process_reply(&mut self, messages: &mut Vec<Message>) -> Result<()> {
        let mut stream = self.agent.reply(messages);
        while let Some(response) = stream.next().await {
            let message = response?;
            messages.push(message.clone());
            self.prompt.render(Box::new(message));
        }
        Ok(())
    }
}
