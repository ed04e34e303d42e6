use log::{debug, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use zine_msg::{
    Author, Chat, CreateChat, CreateMessage, EventContent, Message, MessagesBy, SseMessage,
};
use zine_ref::ChatId;
use zine_store::{entity::EntityMap, Zine};

use crate::{api::InboxApi, Error};

pub const CHATS_PAGE_SIZE: u32 = 50;
pub const MESSAGES_PAGE_SIZE: u32 = 50;

#[derive(Default)]
struct State {
    chats: Vec<Chat>,
    messages: EntityMap<Message>,
}

/// Chats and the messages of the chat being read.
pub struct Inbox {
    api: Arc<dyn InboxApi>,
    zine: Arc<Zine>,
    state: RwLock<State>,
}

impl Inbox {
    pub fn new(api: Arc<dyn InboxApi>, zine: Arc<Zine>) -> Self {
        Inbox {
            api,
            zine,
            state: RwLock::new(State::default()),
        }
    }

    /// Chats, least recently active first.
    pub fn chats(&self) -> Vec<Chat> {
        self.state.read().chats.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.read().messages.to_vec()
    }

    /// Everyone a chat can be started with.
    pub fn recipients(&self) -> Vec<Author> {
        self.zine.sorted_authors()
    }

    /// Replaces the chat list with the first page from the backend.
    pub async fn load_chats(&self) -> Result<Vec<Chat>, Error> {
        let chats = self.api.load_chats(CHATS_PAGE_SIZE, 0).await?;
        debug!("Loaded {} chats", chats.len());
        self.state.write().chats = chats.clone();
        Ok(chats)
    }

    /// Loads messages and adds the ones not seen yet.
    pub async fn load_messages(
        &self,
        by: &MessagesBy,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Message>, Error> {
        let messages = self.api.load_chat_messages(by, limit, offset).await?;
        self.state.write().messages.merge(messages.clone());
        Ok(messages)
    }

    /// Loads the messages of one chat, dropping those of any other.
    pub async fn get_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>, Error> {
        let by = MessagesBy::chat(chat_id.clone());
        let messages = self
            .api
            .load_chat_messages(&by, MESSAGES_PAGE_SIZE, 0)
            .await?;
        let mut state = self.state.write();
        state.messages.clear();
        state.messages.merge(messages.clone());
        Ok(messages)
    }

    /// Sends a message and moves its chat to the end of the list.
    pub async fn send_message(&self, input: &CreateMessage) -> Result<Message, Error> {
        let message = self.api.create_message(input).await?;
        let mut state = self.state.write();
        state.messages.insert(message.clone());
        match state.chats.iter().position(|chat| chat.id == input.chat_id) {
            Some(index) => {
                let mut chat = state.chats.remove(index);
                chat.updated_at = Some(message.created_at);
                state.chats.push(chat);
            }
            None => warn!("Sent message to unknown chat {}", input.chat_id),
        }
        Ok(message)
    }

    pub async fn create_chat(&self, members: Vec<i64>, title: &str) -> Result<Chat, Error> {
        let input = CreateChat {
            members,
            title: title.to_string(),
        };
        let chat = self.api.create_chat(&input).await?;
        self.state.write().chats.insert(0, chat.clone());
        Ok(chat)
    }

    /// Applies a pushed message or chat. Returns whether the event was one.
    pub fn handle_event(&self, event: &SseMessage) -> bool {
        match event.content() {
            EventContent::Message(message) => {
                debug!("Inbox: message {} {}", event.action, message.id);
                self.state.write().messages.insert(message);
                true
            }
            EventContent::Chat(chat) => {
                debug!("Inbox: chat {} {}", event.action, chat.id);
                let mut state = self.state.write();
                match state.chats.iter_mut().find(|known| known.id == chat.id) {
                    Some(known) => *known = chat,
                    None => state.chats.push(chat),
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use zine_store::ApiError;

    use crate::testing::MockCore;

    #[derive(Default)]
    struct MockInbox {
        chats: Mutex<Vec<Chat>>,
        messages: Mutex<Vec<Message>>,
    }

    #[async_trait]
    impl InboxApi for MockInbox {
        async fn load_chats(&self, limit: u32, offset: u32) -> Result<Vec<Chat>, ApiError> {
            Ok(self
                .chats
                .lock()
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn load_chat_messages(
            &self,
            by: &MessagesBy,
            limit: u32,
            _offset: u32,
        ) -> Result<Vec<Message>, ApiError> {
            Ok(self
                .messages
                .lock()
                .iter()
                .filter(|message| by.chat.as_ref().map_or(true, |chat| &message.chat_id == chat))
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn create_message(&self, input: &CreateMessage) -> Result<Message, ApiError> {
            Ok(message(99, input.chat_id.as_str(), 500))
        }

        async fn create_chat(&self, input: &CreateChat) -> Result<Chat, ApiError> {
            let mut created = chat("new");
            created.title = Some(input.title.clone());
            Ok(created)
        }
    }

    fn chat(id: &str) -> Chat {
        serde_json::from_value(json!({ "id": id, "created_at": 1, "created_by": 1 })).unwrap()
    }

    fn message(id: i64, chat_id: &str, created_at: i64) -> Message {
        serde_json::from_value(json!({
            "id": id,
            "chat_id": chat_id,
            "body": "hi",
            "created_by": 1,
            "created_at": created_at,
        }))
        .unwrap()
    }

    fn chat_ids(inbox: &Inbox) -> Vec<String> {
        inbox.chats().iter().map(|chat| chat.id.to_string()).collect()
    }

    fn inbox_with(api: Arc<MockInbox>) -> Inbox {
        Inbox::new(api, Arc::new(Zine::new(Arc::new(MockCore::default()))))
    }

    #[tokio::test]
    async fn sending_moves_chat_to_the_end() {
        let api = Arc::new(MockInbox::default());
        *api.chats.lock() = vec![chat("a"), chat("b"), chat("c")];
        let inbox = inbox_with(api);
        inbox.load_chats().await.unwrap();

        let input = CreateMessage {
            chat_id: ChatId::try_from("a".to_string()).unwrap(),
            body: "hi".to_string(),
            reply_to: None,
        };
        inbox.send_message(&input).await.unwrap();

        assert_eq!(chat_ids(&inbox), vec!["b", "c", "a"]);
        assert_eq!(inbox.chats()[2].updated_at, Some(500));
        assert_eq!(inbox.messages().len(), 1);

        inbox.create_chat(vec![1, 2], "Editors").await.unwrap();
        assert_eq!(chat_ids(&inbox), vec!["new", "b", "c", "a"]);
    }

    #[tokio::test]
    async fn messages_are_deduplicated() {
        let api = Arc::new(MockInbox::default());
        *api.messages.lock() = vec![message(1, "a", 10), message(2, "a", 20), message(3, "b", 30)];
        let inbox = inbox_with(api);

        let by = MessagesBy::chat(ChatId::try_from("a".to_string()).unwrap());
        inbox.load_messages(&by, 50, 0).await.unwrap();
        inbox.load_messages(&by, 50, 0).await.unwrap();
        assert_eq!(inbox.messages().len(), 2);

        let other = ChatId::try_from("b".to_string()).unwrap();
        inbox.get_messages(&other).await.unwrap();
        let ids: Vec<i64> = inbox.messages().iter().map(|message| message.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn pushed_events_are_applied() {
        let inbox = inbox_with(Arc::new(MockInbox::default()));
        let pushed: SseMessage = serde_json::from_value(json!({
            "entity": "message",
            "action": "create",
            "payload": { "id": 7, "chat_id": "a", "created_by": 2, "created_at": 5 },
        }))
        .unwrap();
        assert!(inbox.handle_event(&pushed));
        assert!(inbox.handle_event(&pushed));
        assert_eq!(inbox.messages().len(), 1);

        let chat_event: SseMessage = serde_json::from_value(json!({
            "entity": "chat",
            "action": "create",
            "payload": { "id": "z", "created_at": 1, "created_by": 2 },
        }))
        .unwrap();
        assert!(inbox.handle_event(&chat_event));
        assert_eq!(chat_ids(&inbox), vec!["z"]);

        let reaction: SseMessage =
            serde_json::from_value(json!({ "entity": "reaction", "payload": {} })).unwrap();
        assert!(!inbox.handle_event(&reaction));
        assert!(inbox.recipients().is_empty());
    }
}
