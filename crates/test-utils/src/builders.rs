#![allow(dead_code)]

use agentrun::exec::CommandTemplate;
use agentrun::types::RunRequest;

/// Template whose program is `sh -c <script> agentrun <task>`, so the script
/// sees the task as `$1`.
pub fn sh_template(script: &str) -> CommandTemplate {
    CommandTemplate::new("sh", std::env::temp_dir()).with_args(["-c", script, "agentrun"])
}

/// Template for coordinator tests with a fake launcher; never executed.
pub fn fake_template() -> CommandTemplate {
    CommandTemplate::new("fake-agent", std::env::temp_dir()).with_args(["run_task.py"])
}

/// Builder for `RunRequest` to simplify test setup.
pub struct RunRequestBuilder {
    request: RunRequest,
}

impl RunRequestBuilder {
    pub fn new(task: &str) -> Self {
        Self {
            request: RunRequest::new(task),
        }
    }

    pub fn credential(mut self, key: &str, value: &str) -> Self {
        self.request = self.request.with_credential(key, value);
        self
    }

    pub fn build(self) -> RunRequest {
        self.request
    }
}
