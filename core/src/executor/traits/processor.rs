use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::executor::types::{AgentTask, ProcessorError};

/// Rewrites a task's prompt before it is dispatched.
#[async_trait]
pub trait TaskProcessorPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Higher runs first.
    fn priority(&self) -> i32 {
        0
    }

    async fn process(
        &self,
        task: &AgentTask,
        context: &ProcessContext,
    ) -> Result<ProcessedTask, ProcessorError>;
}

#[derive(Debug, Clone)]
pub struct ProcessContext {
    pub run_id: String,
    /// Directory relative file references resolve against.
    pub workspace: PathBuf,
    pub app_config: Arc<AppConfig>,
}

#[derive(Debug, Clone)]
pub struct ProcessedTask {
    pub original: AgentTask,
    pub enhanced_content: String,
    pub metadata: ProcessMetadata,
}

impl ProcessedTask {
    pub fn unchanged(task: &AgentTask) -> Self {
        Self {
            original: task.clone(),
            enhanced_content: task.prompt.clone(),
            metadata: ProcessMetadata::default(),
        }
    }
}

/// What a processor read while building the prompt.
#[derive(Debug, Clone, Default)]
pub struct ProcessMetadata {
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
}
