//! Kernel command line adjustment for the boot-parameters stage.
//!
//! The installer does not know any vendor kernel arguments itself. A
//! [`BootParams`] strategy receives the current tokens and returns the
//! full replacement list.

use anyhow::Result;

/// Transforms the kernel command line handed to the image.
pub trait BootParams {
    fn apply(&self, current: &[String]) -> Result<Vec<String>>;
}

impl<F> BootParams for F
where
    F: Fn(&[String]) -> Result<Vec<String>>,
{
    fn apply(&self, current: &[String]) -> Result<Vec<String>> {
        self(current)
    }
}

/// Leaves the command line untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepBootParams;

impl BootParams for KeepBootParams {
    fn apply(&self, current: &[String]) -> Result<Vec<String>> {
        Ok(current.to_vec())
    }
}

/// Appends fixed tokens that are not already present.
#[derive(Debug, Clone, Default)]
pub struct AppendBootParams {
    args: Vec<String>,
}

impl AppendBootParams {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl BootParams for AppendBootParams {
    fn apply(&self, current: &[String]) -> Result<Vec<String>> {
        let mut out = current.to_vec();
        for arg in &self.args {
            if !out.contains(arg) {
                out.push(arg.clone());
            }
        }
        Ok(out)
    }
}
