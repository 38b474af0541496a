use std::process::{ExitStatus, Output};

pub trait ExitStatusExt {
    /// The exit status and stdout followed by stderr, each terminated
    /// with a newline if not empty.
    fn status_and_outputs(&self) -> (ExitStatus, String);
}

impl ExitStatusExt for Output {
    fn status_and_outputs(&self) -> (ExitStatus, String) {
        let mut outputs = String::new();
        for stream in [&self.stdout, &self.stderr] {
            let s = String::from_utf8_lossy(stream);
            if !s.is_empty() {
                outputs.push_str(&s);
                if !s.ends_with('\n') {
                    outputs.push('\n');
                }
            }
        }
        (self.status, outputs)
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::process::ExitStatusExt as _;

    use super::*;

    #[test]
    fn t_status_and_outputs() {
        let output = Output {
            status: ExitStatus::from_raw(256),
            stdout: b"half a line".to_vec(),
            stderr: b"boom\n".to_vec(),
        };
        let (status, s) = output.status_and_outputs();
        assert_eq!(status.code(), Some(1));
        assert_eq!(s, "half a line\nboom\n");
    }
}
