pub const DEFAULT_EXECUTABLE: &str = "a.out";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MEMCHECK_TIMEOUT_SECS: u64 = 60;

pub const OUTPUT_LOG: &str = "output.log";
pub const VALGRIND_LOG: &str = "valgrind.log";

pub const GCC_ENV: &str = "LABCHECK_GCC";

/// Valgrind prints this line only when every allocation was released.
pub const NO_LEAKS_PHRASE: &str = "All heap blocks were freed -- no leaks are possible";

pub const NO_EXE_MSG: &str = "There was no executable.";
pub const SEG_FAULT_MSG: &str = "Segmentation fault detected!";
pub const VALGRIND_ERRORS_MSG: &str = "Valgrind: There were errors in your program!";
pub const VALGRIND_LEAK_MSG: &str = "Valgrind: Memory leak detected!";
pub const TIMEOUT_MSG: &str = "Execution timed out!";
pub const MEMCHECK_TIMEOUT_MSG: &str = "Valgrind: Analysis timed out!";
pub const TOOL_UNAVAILABLE_MSG: &str = "Valgrind could not be started!";
