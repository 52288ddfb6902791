use std::collections::HashMap;

use delve_types::{Message, Role, ThreadMetadata};

/// In-memory conversation state: the visible transcript plus thread
/// bookkeeping for both backends. Thread ids are namespaced per
/// backend because the two servers do not share threads.
#[derive(Debug, Default)]
pub struct SessionStore {
    messages: Vec<Message>,
    threads: HashMap<String, ThreadMetadata>,
    current_thread: Option<String>,
    react_thread: Option<String>,
    deep_thread: Option<String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        if let Some(meta) = self.current_meta_mut() {
            meta.message_count += 1;
        }
    }

    /// Drop the message at `index` and everything after it. Returns
    /// the new length.
    pub fn truncate_from(&mut self, index: usize) -> usize {
        self.messages.truncate(index);
        let len = self.messages.len();
        if let Some(meta) = self.current_meta_mut() {
            meta.message_count = len;
        }
        len
    }

    pub fn message(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn message_mut(&mut self, index: usize) -> Option<&mut Message> {
        self.messages.get_mut(index)
    }

    /// History sent alongside a new question: every message before
    /// `before_index`, so the question itself is excluded.
    pub fn history_before(&self, before_index: usize) -> Vec<Message> {
        self.messages[..before_index.min(self.messages.len())].to_vec()
    }

    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Remember a newly created server thread and make it current.
    pub fn register_thread(&mut self, thread_id: String, meta: ThreadMetadata) {
        self.threads.insert(thread_id.clone(), meta);
        self.current_thread = Some(thread_id);
    }

    pub fn thread_meta(&self, thread_id: &str) -> Option<&ThreadMetadata> {
        self.threads.get(thread_id)
    }

    pub fn current_thread(&self) -> Option<&str> {
        self.current_thread.as_deref()
    }

    pub fn thread_for_backend(&self, deep: bool) -> Option<&str> {
        if deep {
            self.deep_thread.as_deref()
        } else {
            self.react_thread.as_deref()
        }
    }

    pub fn set_thread_for_backend(&mut self, deep: bool, thread_id: String) {
        self.current_thread = Some(thread_id.clone());
        if deep {
            self.deep_thread = Some(thread_id);
        } else {
            self.react_thread = Some(thread_id);
        }
    }

    pub fn forget_thread(&mut self, thread_id: &str) {
        self.threads.remove(thread_id);
        if self.current_thread.as_deref() == Some(thread_id) {
            self.current_thread = None;
        }
        if self.react_thread.as_deref() == Some(thread_id) {
            self.react_thread = None;
        }
        if self.deep_thread.as_deref() == Some(thread_id) {
            self.deep_thread = None;
        }
    }

    /// Clear the transcript and thread pointers for a fresh chat.
    /// Known thread metadata is kept so past threads stay listable.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.current_thread = None;
        self.react_thread = None;
        self.deep_thread = None;
    }

    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        let len = self.messages.len();
        if let Some(meta) = self.current_meta_mut() {
            meta.message_count = len;
        }
    }

    fn current_meta_mut(&mut self) -> Option<&mut ThreadMetadata> {
        let id = self.current_thread.clone()?;
        self.threads.get_mut(&id)
    }
}
