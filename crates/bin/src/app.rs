use parley::{
    Clock, Node, Result,
    auth::AuthSession,
    store::{KeysWatch, ValueWatch},
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::{ChatMessage, MESSAGES_PREFIX, message_key};

/// Which page is shown below the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Messages,
}

/// Focused area of the message page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Composer,
    List,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

/// Login form with uncontrolled inputs: what is typed lives in the field
/// buffers and is only captured when a field loses focus or on submit.
#[derive(Debug, Default)]
pub struct LoginForm {
    pub username_input: String,
    pub password_input: String,
    username: String,
    password: String,
    pub focus: LoginField,
}

impl LoginForm {
    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username_input,
            LoginField::Password => &mut self.password_input,
        }
    }

    pub fn push(&mut self, c: char) {
        self.focused_input().push(c);
    }

    pub fn backspace(&mut self) {
        self.focused_input().pop();
    }

    /// Capture the focused field's buffer.
    pub fn blur(&mut self) {
        match self.focus {
            LoginField::Username => self.username = self.username_input.clone(),
            LoginField::Password => self.password = self.password_input.clone(),
        }
    }

    /// Move focus to the other field, capturing the one being left.
    pub fn toggle_focus(&mut self) {
        self.blur();
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    /// Captured credentials, after capturing the focused field.
    pub fn credentials(&mut self) -> (String, String) {
        self.blur();
        (self.username.clone(), self.password.clone())
    }
}

/// One row of the message list. Subscribes to its own key.
#[derive(Debug)]
pub struct MessageItem {
    pub time: String,
    watch: ValueWatch,
    pub message: Option<std::result::Result<ChatMessage, String>>,
}

/// Open inline editor, bound to the key being edited rather than to a row,
/// since rows shift when earlier messages arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub key: String,
    pub buffer: String,
}

impl MessageItem {
    fn new(node: &Node, time: String) -> Self {
        let watch = node.watch_value(format!("{MESSAGES_PREFIX}.{time}"));
        let mut item = Self {
            time,
            watch,
            message: None,
        };
        item.decode();
        item
    }

    pub fn key(&self) -> &str {
        self.watch.key()
    }

    fn refresh(&mut self) -> bool {
        let changed = self.watch.refresh();
        if changed {
            self.decode();
        }
        changed
    }

    fn decode(&mut self) {
        self.message = self.watch.get().map(|json| {
            ChatMessage::decode(json).map_err(|e| {
                warn!(key = %self.watch.key(), error = %e, "Unreadable message");
                e.to_string()
            })
        });
    }
}

pub struct App {
    node: Node,
    auth: watch::Receiver<AuthSession>,
    pub session: AuthSession,
    pub login: LoginForm,

    // Message page state
    pub input: String,
    keys: KeysWatch,
    pub items: Vec<MessageItem>,
    pub selected: usize,
    pub focus: Focus,
    pub editing: Option<Edit>,

    /// Peer this client dialed, shown in the header.
    pub peer: Option<String>,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(node: Node) -> Self {
        let auth = node.watch_auth();
        let session = auth.borrow().clone();
        let keys = node.watch_keys(MESSAGES_PREFIX);
        let mut app = Self {
            node,
            auth,
            session,
            login: LoginForm::default(),
            input: String::new(),
            keys,
            items: Vec::new(),
            selected: 0,
            focus: Focus::Composer,
            editing: None,
            peer: None,
            status_message: None,
            should_quit: false,
        };
        app.rebuild_items();
        app
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn screen(&self) -> Screen {
        if self.session.is_authenticated() {
            Screen::Messages
        } else {
            Screen::Login
        }
    }

    /// Pull pending updates from the node's subscriptions. Returns true when
    /// anything visible changed.
    pub fn refresh(&mut self) -> bool {
        let mut changed = false;
        if self.auth.has_changed().unwrap_or(false) {
            self.session = self.auth.borrow_and_update().clone();
            changed = true;
        }
        if self.keys.refresh() {
            self.rebuild_items();
            changed = true;
        }
        for item in &mut self.items {
            changed |= item.refresh();
        }
        changed
    }

    /// Reconcile items with the current key set, keeping existing items for
    /// keys that are still present. The selection follows the edited message,
    /// or else the previously selected one.
    fn rebuild_items(&mut self) {
        let anchor = match &self.editing {
            Some(edit) => Some(edit.key.clone()),
            None => self.items.get(self.selected).map(|item| item.key().to_string()),
        };
        let mut previous = std::mem::take(&mut self.items);
        self.items = self
            .keys
            .get()
            .iter()
            .map(|time| match previous.iter().position(|item| &item.time == time) {
                Some(index) => previous.swap_remove(index),
                None => MessageItem::new(&self.node, time.clone()),
            })
            .collect();
        if let Some(index) = anchor
            .and_then(|key| self.items.iter().position(|item| item.key() == key))
        {
            self.selected = index;
        }
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    pub async fn submit_login(&mut self) {
        let (username, password) = self.login.credentials();
        match self.node.login(&username, &password).await {
            Ok(session) => {
                self.session = session;
                self.login = LoginForm::default();
                self.status_message = None;
                self.refresh();
            }
            Err(e) => {
                self.status_message = Some(format!("Login failed: {e}"));
            }
        }
    }

    /// Write the composer's text as a new message and clear the input.
    /// Returns the new key, or None when there was nothing to send.
    pub fn send_message(&mut self) -> Result<Option<String>> {
        if self.input.trim().is_empty() {
            return Ok(None);
        }
        let username = self.session.username.clone().unwrap_or_default();
        let message = ChatMessage::new(self.input.clone(), username);
        let key = message_key(self.node.store().clock().now_millis());
        self.node.put(key.clone(), message.encode()?)?;
        debug!(key = %key, "Sent message");
        self.input.clear();
        Ok(Some(key))
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Whether the inline editor is open on `item`.
    pub fn edit_for(&self, item: &MessageItem) -> Option<&Edit> {
        self.editing.as_ref().filter(|edit| edit.key == item.key())
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Composer => Focus::List,
            Focus::List => Focus::Composer,
        };
    }

    /// Open the inline editor on the selected message.
    pub fn begin_edit(&mut self) {
        let Some(item) = self.items.get(self.selected) else {
            return;
        };
        match &item.message {
            Some(Ok(message)) => {
                self.editing = Some(Edit {
                    key: item.key().to_string(),
                    buffer: message.text.clone(),
                })
            }
            _ => self.status_message = Some("This message cannot be edited".to_string()),
        }
    }

    pub fn edit_buffer(&mut self) -> Option<&mut String> {
        self.editing.as_mut().map(|edit| &mut edit.buffer)
    }

    /// Close the editor without writing.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Rewrite the edited message under the same key, keeping its author.
    ///
    /// The editor closes even when the write fails; the error is returned for
    /// the status line.
    pub fn commit_edit(&mut self) -> Result<()> {
        let Some(edit) = self.editing.take() else {
            return Ok(());
        };
        let current = self
            .items
            .iter()
            .find(|item| item.key() == edit.key)
            .and_then(|item| item.message.as_ref());
        match current {
            Some(Ok(message)) => {
                let updated = message.with_text(edit.buffer);
                self.node.put(edit.key.clone(), updated.encode()?)?;
                debug!(key = %edit.key, "Edited message");
            }
            _ => {
                warn!(key = %edit.key, "Edited message is no longer readable, dropping edit");
                self.status_message = Some("Edit discarded: message is unreadable".to_string());
            }
        }
        Ok(())
    }
}
