pub mod archiver;
pub mod backup_config;
pub mod mongo;
pub mod naming;
pub mod object_store;
pub mod orchestrator;
pub mod redacted;
pub mod result_error;
pub mod retention;
pub mod shell;
pub mod validate;

#[cfg(test)]
mod test_support;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
