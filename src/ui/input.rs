//! 行输入源
//!
//! `tokio::io::stdin` 在运行时的阻塞线程池里读取，读取无法中途取消：Ctrl+C 后交互循环虽已返回，
//! 运行时关闭仍会等那次读取结束（直到用户回车）。ThreadedLines 改用独立的 std 线程读取并经
//! mpsc 通道转发，线程不归运行时管理，进程退出时不会被它拖住。

use std::io::{self, BufRead};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc;

/// 通道缓冲行数
const LINE_BUFFER: usize = 16;

/// 逐行输入；next_line 必须可安全取消（被 select! 丢弃时不丢行）
#[async_trait]
pub trait LineSource: Send {
    /// 下一行（不含换行符）；输入结束返回 None
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

#[async_trait]
impl<R> LineSource for Lines<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        Lines::next_line(self).await
    }
}

/// 在独立线程中读取阻塞式输入
pub struct ThreadedLines {
    rx: mpsc::Receiver<io::Result<String>>,
}

impl ThreadedLines {
    /// 进程标准输入
    pub fn stdin() -> Self {
        Self::spawn(io::BufReader::new(io::stdin()))
    }

    pub fn spawn<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let spawned = std::thread::Builder::new()
            .name("pdfqa-input".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    // 接收端已关闭（循环已结束）时停止读取
                    if tx.blocking_send(line).is_err() || failed {
                        return;
                    }
                }
            });
        // 线程起不来时 tx 已随闭包丢弃，接收端立即读到 EOF
        if let Err(e) = spawned {
            tracing::error!("Failed to spawn input thread: {}", e);
        }
        Self { rx }
    }
}

#[async_trait]
impl LineSource for ThreadedLines {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.rx.recv().await.transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::sync::mpsc as std_mpsc;

    use super::*;

    #[tokio::test]
    async fn test_threaded_lines_forwards_until_eof() {
        let mut lines = ThreadedLines::spawn(io::Cursor::new(b"first\nsecond\n".to_vec()));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("second"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    /// 读取时一直阻塞，直到持有的发送端被丢弃
    struct StalledReader(std_mpsc::Receiver<()>);

    impl Read for StalledReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_threaded_lines_reports_read_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "tty gone"))
            }
        }
        let mut lines = ThreadedLines::spawn(io::BufReader::new(Broken));
        assert!(lines.next_line().await.is_err());
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_threaded_lines_pending_while_reader_blocks() {
        let (release, stall) = std_mpsc::channel::<()>();
        let mut lines = ThreadedLines::spawn(io::BufReader::new(StalledReader(stall)));
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), lines.next_line()).await;
        assert!(waited.is_err());
        drop(release);
        assert_eq!(lines.next_line().await.unwrap(), None);
    }
}
