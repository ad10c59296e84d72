use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use parley::config::Config;
use parley::error::{ParleyError, Result};
use parley::providers::{CompletionResponse, Message, ModelInfo, Provider, TokenUsage};
use parley::storage::SqliteStorage;
use parley::AppContext;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("memory.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// What the scripted provider does on its next `complete` call
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    ReplyWithUsage(String, TokenUsage),
    Fail(String),
    Hang,
}

/// Calls observed by a [`ScriptedProvider`]
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct Calls {
    pub completions: Vec<(String, Vec<Message>)>,
    pub unloaded: Vec<String>,
}

/// In-process provider that plays back a script of replies
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    models: Vec<String>,
    calls: Arc<Mutex<Calls>>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> (Self, Arc<Mutex<Calls>>) {
        Self::with_models(steps, &["llama3.2:latest"])
    }

    pub fn with_models(steps: Vec<Step>, models: &[&str]) -> (Self, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let provider = Self {
            steps: Mutex::new(steps.into()),
            models: models.iter().map(|m| m.to_string()).collect(),
            calls: Arc::clone(&calls),
        };
        (provider, calls)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<CompletionResponse> {
        self.calls
            .lock()
            .unwrap()
            .completions
            .push((model.to_string(), messages.to_vec()));

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::Fail("script exhausted".to_string()));

        match step {
            Step::Reply(text) => Ok(CompletionResponse::new(text)),
            Step::ReplyWithUsage(text, usage) => Ok(CompletionResponse::with_usage(text, usage)),
            Step::Fail(reason) => Err(ParleyError::Inference(reason).into()),
            Step::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(self
            .models
            .iter()
            .map(|name| ModelInfo {
                name: name.clone(),
                size: 0,
                modified_at: String::new(),
            })
            .collect())
    }

    async fn unload_model(&self, model: &str) -> Result<()> {
        self.calls.lock().unwrap().unloaded.push(model.to_string());
        Ok(())
    }
}

/// An application context over a temp database and config file
#[allow(dead_code)]
pub struct TestApp {
    pub app: AppContext,
    pub calls: Arc<Mutex<Calls>>,
    pub dir: TempDir,
}

#[allow(dead_code)]
pub fn test_app(steps: Vec<Step>) -> TestApp {
    test_app_with_models(steps, &["llama3.2:latest"])
}

#[allow(dead_code)]
pub fn test_app_with_models(steps: Vec<Step>, models: &[&str]) -> TestApp {
    let dir = TempDir::new().expect("failed to create tempdir");
    let mut config = Config::default();
    config.storage.database_path = Some(dir.path().join("memory.db"));
    config.chat.export_dir = dir.path().join("exports");

    let config_path = dir.path().join("config.yaml");
    config
        .save(config_path.to_str().unwrap())
        .expect("failed to write config");

    let storage = SqliteStorage::new_with_path(dir.path().join("memory.db"))
        .expect("failed to create sqlite storage");
    let (provider, calls) = ScriptedProvider::with_models(steps, models);
    let app = AppContext::new(
        config,
        config_path.to_string_lossy(),
        storage,
        Box::new(provider),
    );

    TestApp { app, calls, dir }
}
