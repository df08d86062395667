/// Engine settings applied to an instance when it is created.
///
/// ```
/// let config = wadex::Config::default().max_call_depth(256).fuel(Some(10_000));
/// assert_eq!(config.max_call_depth, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How many calls may be nested before execution fails with
    /// [`ExecError::CallStackExhausted`](crate::ExecError::CallStackExhausted).
    pub max_call_depth: usize,

    /// Number of ops a single call from the embedder may execute, nested calls included.
    /// `None` means unlimited.
    pub fuel: Option<u64>,

    /// Most locals, parameters included, a single function may declare. Larger functions fail
    /// to instantiate with [`InstantiateError::TooManyLocals`](crate::InstantiateError::TooManyLocals).
    pub max_locals: usize,

    /// Largest initial size a module may declare for one of its tables. Larger tables fail to
    /// instantiate with [`InstantiateError::TableTooLarge`](crate::InstantiateError::TableTooLarge).
    pub max_table_elements: u32,

    /// Let [`Instance::call`](crate::Instance::call) take missing trailing arguments from the
    /// instance's operand stack instead of failing with an arity error.
    pub backfill_args: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: 1024,
            fuel: None,
            max_locals: 50_000,
            max_table_elements: 10_000_000,
            backfill_args: false,
        }
    }
}

impl Config {
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn fuel(mut self, fuel: Option<u64>) -> Self {
        self.fuel = fuel;
        self
    }

    pub fn max_locals(mut self, count: usize) -> Self {
        self.max_locals = count;
        self
    }

    pub fn max_table_elements(mut self, count: u32) -> Self {
        self.max_table_elements = count;
        self
    }

    pub fn backfill_args(mut self, enabled: bool) -> Self {
        self.backfill_args = enabled;
        self
    }
}
