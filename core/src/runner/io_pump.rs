use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::CaptureBuffer;

#[derive(Debug, Clone, Copy)]
pub enum LineStream {
    Stdout,
    Stderr,
}

impl LineStream {
    fn label(self) -> &'static str {
        match self {
            LineStream::Stdout => "stdout",
            LineStream::Stderr => "stderr",
        }
    }
}

pub fn pump_stdout<R>(rd: R, buf: CaptureBuffer, task_id: String) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(rd, buf, task_id, LineStream::Stdout)
}

pub fn pump_stderr<R>(rd: R, buf: CaptureBuffer, task_id: String) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(rd, buf, task_id, LineStream::Stderr)
}

/// Copy `rd` into `buf` until EOF. Complete lines are traced as they arrive.
fn pump<R>(
    mut rd: R,
    buf: CaptureBuffer,
    task_id: String,
    stream: LineStream,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let label = stream.label();
        let mut chunk = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        let mut line_buf: Vec<u8> = Vec::with_capacity(8 * 1024);

        loop {
            let n = rd.read(&mut chunk).await.map_err(|e| RunnerError::StreamIo {
                stream: label,
                source: e,
            })?;
            if n == 0 {
                break;
            }

            buf.push(&chunk[..n]);
            total += n as u64;

            line_buf.extend_from_slice(&chunk[..n]);
            while let Some(pos) = line_buf.iter().position(|&b| b == b'\n') {
                let mut one = line_buf.drain(..=pos).collect::<Vec<u8>>();
                trim_newline(&mut one);
                tracing::trace!(
                    target: "subagent.child",
                    task_id = %task_id,
                    stream = label,
                    line = %String::from_utf8_lossy(&one)
                );
            }
        }

        // EOF flush: the last partial line if it doesn't end with '\n'.
        trim_newline(&mut line_buf);
        if !line_buf.is_empty() {
            tracing::trace!(
                target: "subagent.child",
                task_id = %task_id,
                stream = label,
                line = %String::from_utf8_lossy(&line_buf)
            );
        }

        Ok(total)
    })
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn captures_everything_until_eof() {
        let (mut wr, rd) = tokio::io::duplex(64);
        let buf = CaptureBuffer::new();

        let task = pump_stdout(rd, buf.clone(), "t".to_string());

        wr.write_all(b"line one\nline two").await.unwrap();
        drop(wr);

        let total = task.await.unwrap().unwrap();
        assert_eq!(total, 17);
        assert_eq!(buf.to_string_lossy(), "line one\nline two");
    }
}
