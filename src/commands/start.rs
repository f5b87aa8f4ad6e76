use crate::client::{BotClient, ClientError};

use log::info;
use teloxide::prelude::*;

pub const WELCOME_TEXT: &str = "Welcome.";

pub async fn process(client: &dyn BotClient, msg: &Message) -> Result<(), ClientError> {
    let user = msg
        .from()
        .map_or_else(|| String::from("unknown"), |user| user.id.0.to_string());

    info!("Received /start command from user {user}");

    client.send_text(msg.chat.id, WELCOME_TEXT).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingClient;
    use crate::commands::fixtures::{parse, start_update};
    use log::Level;
    use teloxide::types::UpdateKind;

    #[tokio::test]
    async fn logs_the_sender_once_and_replies_once() {
        testing_logger::setup();
        let client = RecordingClient::default();
        let UpdateKind::Message(msg) = parse(start_update(1, 4242)).kind else {
            panic!("fixture is not a message");
        };

        process(&client, &msg).await.unwrap();

        assert_eq!(client.sent(), vec![(ChatId(4242), WELCOME_TEXT.to_owned())]);
        testing_logger::validate(|logs| {
            let mentions: Vec<_> = logs
                .iter()
                .filter(|record| record.body.contains("4242"))
                .collect();

            assert_eq!(mentions.len(), 1);
            assert_eq!(mentions[0].level, Level::Info);
        });
    }
}
