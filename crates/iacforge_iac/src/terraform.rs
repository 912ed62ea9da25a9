//! Terraform command runner.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{IacError, IacResult};

/// Default limit for a single Terraform command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of a Terraform command.
#[derive(Debug, Clone)]
pub struct TerraformResult {
    pub success: bool,
    pub output: String,
    pub exit_code: i32,
}

/// Runs the Terraform CLI as a child process.
#[derive(Debug, Clone)]
pub struct TerraformRunner {
    program: String,
    prefix_args: Vec<String>,
    timeout: Duration,
}

impl Default for TerraformRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TerraformRunner {
    /// Runner for `terraform` on the `PATH`.
    pub fn new() -> Self {
        Self {
            program: "terraform".to_string(),
            prefix_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different Terraform binary.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.program = binary.into();
        self.prefix_args.clear();
        self
    }

    /// Run Terraform through a wrapper, e.g. `docker run ... hashicorp/terraform`.
    ///
    /// The Terraform arguments are appended after `args`.
    pub fn with_program<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program = program.into();
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the program can be started at all.
    pub fn is_available(&self) -> bool {
        let mut command = Command::new(&self.program);
        command
            .args(&self.prefix_args)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        match command.status() {
            Ok(_) => true,
            Err(e) => {
                debug!("{} is not available: {}", self.program, e);
                false
            }
        }
    }

    /// Run `terraform init` without a backend.
    pub fn init(&self, working_dir: &Path) -> IacResult<TerraformResult> {
        info!("Running terraform init in {:?}", working_dir);
        self.run_command(
            working_dir,
            &["init", "-backend=false", "-input=false", "-no-color"],
        )
    }

    /// Run `terraform validate`.
    pub fn validate(&self, working_dir: &Path) -> IacResult<TerraformResult> {
        info!("Running terraform validate in {:?}", working_dir);
        self.run_command(working_dir, &["validate", "-no-color"])
    }

    fn run_command(&self, working_dir: &Path, args: &[&str]) -> IacResult<TerraformResult> {
        debug!("Executing {} {:?}", self.program, args);

        let mut command = Command::new(&self.program);
        command
            .args(&self.prefix_args)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                IacError::ToolNotAvailable(format!("{}: {}", self.program, e))
            }
            _ => IacError::Io(e),
        })?;

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match self.wait_with_timeout(&mut child)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(IacError::Timeout {
                    tool: self.program.clone(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let mut output = stdout.join().unwrap_or_default();
        let errors = stderr.join().unwrap_or_default();
        if !errors.is_empty() {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&errors);
        }

        Ok(TerraformResult {
            success: status.success(),
            output,
            exit_code: status.code().unwrap_or(-1),
        })
    }

    fn wait_with_timeout(&self, child: &mut Child) -> IacResult<Option<std::process::ExitStatus>> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if started.elapsed() >= self.timeout {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buffer);
        }
        buffer
    })
}
