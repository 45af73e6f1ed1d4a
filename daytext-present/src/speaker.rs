use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Something that can read a line of text aloud.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str) -> io::Result<()>;

    fn name(&self) -> &str;
}

/// Speaks by running an external program with the text as its last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The usual speech program for this platform, whether or not it is installed.
    pub fn platform_default() -> Option<Self> {
        #[cfg(target_os = "macos")]
        {
            Some(Self::new("say", Vec::new()))
        }

        #[cfg(target_os = "linux")]
        {
            Some(Self::new("espeak", Vec::new()))
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }

    /// [`CommandSpeaker::platform_default`] if its program is on `PATH`.
    pub fn detect() -> Option<Self> {
        Self::platform_default().filter(|s| s.is_installed())
    }

    /// Whether the program resolves to a file, directly or through `PATH`.
    pub fn is_installed(&self) -> bool {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file();
        }
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Speaker for CommandSpeaker {
    async fn speak(&self, text: &str) -> io::Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("{} exited with {status}", self.program)))
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}
