//! Append-only plain-text transcript of a chat session.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::message::Message;

pub struct TranscriptLog {
    file_path: PathBuf,
}

impl TranscriptLog {
    /// Opens (creating if needed) `path` and checks it is writable.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let file_path = path.into();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;
        file.flush()?;
        Ok(Self { file_path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Writes one sealed message. Open model messages are skipped.
    pub fn log_message(&self, message: &Message) -> Result<(), Box<dyn std::error::Error>> {
        if message.is_streaming {
            return Ok(());
        }

        let header = if message.is_user() {
            format!("Customer [{}]:", message.created_at.format("%H:%M"))
        } else {
            let code = message
                .active_persona
                .map(|persona| persona.code())
                .unwrap_or("ROUTING");
            format!("Banking Agent <{code}> [{}]:", message.created_at.format("%H:%M"))
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        let mut writer = BufWriter::with_capacity(64 * 1024, file);

        writeln!(writer, "{header}")?;
        for line in message.content.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::ConversationStore;
    use crate::core::message::{MessagePatch, NewMessage};
    use crate::core::persona::PersonaTag;
    use tempfile::TempDir;

    #[test]
    fn sealed_messages_are_appended_with_headers() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("chat.log");
        let log = TranscriptLog::new(&path).expect("log opens");

        let mut store = ConversationStore::new();
        let user = store.append(NewMessage::user("Cek saldo")).unwrap();
        let reply = store.append(NewMessage::model_placeholder()).unwrap();

        log.log_message(store.get(user).unwrap()).unwrap();
        log.log_message(store.get(reply).unwrap()).unwrap();
        store.update_by_id(
            reply,
            MessagePatch::default()
                .content("**AMA** here\nSaldo: 100")
                .persona(PersonaTag::AccountManagement)
                .sealed(),
        );
        log.log_message(store.get(reply).unwrap()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Customer ["));
        assert!(written.contains("Cek saldo\n"));
        assert!(written.contains("Banking Agent <AMA> ["));
        assert!(written.contains("Saldo: 100\n"));
        assert_eq!(written.matches("Banking Agent").count(), 1);
    }

    #[test]
    fn unwritable_path_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let missing_parent = dir.path().join("nope").join("chat.log");
        assert!(TranscriptLog::new(missing_parent).is_err());
    }
}
