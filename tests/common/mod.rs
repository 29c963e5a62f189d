#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use m365ctl::{
    config::{Config, OutputFormat},
    context::CommandContext,
    fs::LocalFs,
    prompt::Prompter,
};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ME: &str = "megan@contoso.com";

/// Unsigned JWT carrying `claims`
pub fn token(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

pub fn delegated_token() -> String {
    token(json!({"scp": "Chat.Read Files.ReadWrite", "upn": ME}))
}

pub fn app_token() -> String {
    token(json!({"roles": ["Chat.Read.All"]}))
}

/// Matches `path` whether or not the query string is part of what mockito compares
pub fn path(path: &str) -> Matcher {
    Matcher::Regex(format!("^{}(\\?|$)", regex::escape(path)))
}

pub fn config(server: &Server, prompt: bool) -> Config {
    Config::new(
        &server.url(),
        &server.url(),
        prompt,
        OutputFormat::Json,
        Duration::from_secs(5),
    )
}

/// Context pointed at the mock server, answering prompts with `prompter`
pub fn context(server: &Server, prompt: bool, prompter: ScriptedPrompter) -> Result<CommandContext> {
    Ok(CommandContext::new(config(server, prompt), Some(delegated_token()))?.with_prompter(prompter))
}

/// Prompter that answers from a script and records every question
#[derive(Clone, Default)]
pub struct ScriptedPrompter {
    confirm: bool,
    selections: Arc<Mutex<VecDeque<usize>>>,
    inputs: Arc<Mutex<VecDeque<String>>>,
    pub questions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirming(mut self, answer: bool) -> Self {
        self.confirm = answer;
        self
    }

    pub fn selecting(self, index: usize) -> Self {
        self.selections.lock().unwrap().push_back(index);
        self
    }

    pub fn answering(self, input: &str) -> Self {
        self.inputs.lock().unwrap().push_back(input.to_string());
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    fn record(&self, message: &str) {
        self.questions.lock().unwrap().push(message.to_string());
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        self.record(message);
        Ok(self.confirm)
    }

    fn select(&self, message: &str, _choices: &[String]) -> Result<usize> {
        self.record(message);
        self.selections
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unexpected selection prompt: {}", message))
    }

    fn input(&self, message: &str) -> Result<String> {
        self.record(message);
        self.inputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unexpected input prompt: {}", message))
    }
}

/// Real filesystem whose unlink always fails, recording what it was asked to remove
#[derive(Clone, Default)]
pub struct StuckFs {
    pub removed: Arc<Mutex<Vec<PathBuf>>>,
}

#[async_trait]
impl LocalFs for StuckFs {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.removed.lock().unwrap().push(path.to_path_buf());
        Err(io::Error::other("file is locked"))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

/// Real filesystem that records every path it unlinks
#[derive(Clone, Default)]
pub struct RecordingFs {
    pub removed: Arc<Mutex<Vec<PathBuf>>>,
}

#[async_trait]
impl LocalFs for RecordingFs {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.removed.lock().unwrap().push(path.to_path_buf());
        tokio::fs::remove_file(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}
