use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed worker count. `None` means one worker per logical CPU.
    pub worker_threads: Option<usize>,

    /// Queue bound. `None` means unbounded; submissions then never block.
    pub queue_capacity: Option<usize>,

    pub stack_size: Option<usize>,
    pub thread_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_threads: None,
            queue_capacity: None,
            stack_size: Some(2 * 1024 * 1024),
            thread_name_prefix: "taskwell-worker".to_string(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.worker_threads {
            if n == 0 {
                return Err(Error::config("worker_threads must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("worker_threads too large (max 1024)"));
            }
        }

        if self.queue_capacity == Some(0) {
            return Err(Error::config(
                "queue_capacity must be > 0; leave unset for an unbounded queue",
            ));
        }

        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn worker_threads(mut self, n: usize) -> Self {
        self.config.worker_threads = Some(n);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    pub fn unbounded_queue(mut self) -> Self {
        self.config.queue_capacity = None;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
