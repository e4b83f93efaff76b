use eyre::{Result, WrapErr};
use lttb::Encoding;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader, BufWriter, ReadBuf};

/// Input files default to stdin.
pub fn sources(files: &[String]) -> Vec<String> {
    if files.is_empty() {
        vec!["stdin".to_string()]
    } else {
        files.to_vec()
    }
}

#[derive(Debug)]
pub enum Input {
    Stdin(BufReader<tokio::io::Stdin>),
    File(BufReader<File>),
}

impl Input {
    pub async fn from_filename(name: &str) -> Result<Self> {
        match name {
            "stdin" | "-" => Ok(Input::Stdin(BufReader::new(tokio::io::stdin()))),
            _ => {
                let f = File::open(name)
                    .await
                    .wrap_err_with(|| format!("opening {}", name))?;
                Ok(Input::File(BufReader::new(f)))
            }
        }
    }
}

/// Skips leading whitespace and returns the explicit encoding, or the one
/// sniffed from the first non-blank byte. `None` means the input is empty
/// or blank.
pub async fn detect_encoding<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    explicit: Option<Encoding>,
) -> Result<Option<Encoding>> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let first = buf[pos];
                reader.consume(pos);
                return Ok(Some(explicit.unwrap_or_else(|| Encoding::detect(first))));
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

impl AsyncRead for Input {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Input::Stdin(reader) => Pin::new(reader).poll_read(cx, buf),
            Input::File(reader) => Pin::new(reader).poll_read(cx, buf),
        }
    }
}

impl AsyncBufRead for Input {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        match self.get_mut() {
            Input::Stdin(reader) => Pin::new(reader).poll_fill_buf(cx),
            Input::File(reader) => Pin::new(reader).poll_fill_buf(cx),
        }
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        match self.get_mut() {
            Input::Stdin(reader) => Pin::new(reader).consume(amt),
            Input::File(reader) => Pin::new(reader).consume(amt),
        }
    }
}

#[derive(Debug)]
pub enum Output {
    Stdout(BufWriter<tokio::io::Stdout>),
    File(BufWriter<File>),
}

impl Output {
    pub async fn from_filename(name: &str) -> Result<Self> {
        match name {
            "stdout" | "-" => Ok(Output::Stdout(BufWriter::new(tokio::io::stdout()))),
            _ => {
                let f = File::create(name)
                    .await
                    .wrap_err_with(|| format!("creating {}", name))?;
                Ok(Output::File(BufWriter::new(f)))
            }
        }
    }
}

impl AsyncWrite for Output {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        match self.get_mut() {
            Output::Stdout(writer) => Pin::new(writer).poll_write(cx, buf),
            Output::File(writer) => Pin::new(writer).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        match self.get_mut() {
            Output::Stdout(writer) => Pin::new(writer).poll_flush(cx),
            Output::File(writer) => Pin::new(writer).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        match self.get_mut() {
            Output::Stdout(writer) => Pin::new(writer).poll_shutdown(cx),
            Output::File(writer) => Pin::new(writer).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn sources_default_to_stdin() {
        assert_eq!(sources(&[]), vec!["stdin".to_string()]);
        let files = vec!["a.json".to_string(), "b.csv".to_string()];
        assert_eq!(sources(&files), files);
    }

    #[tokio::test]
    async fn detect_encoding_sniffs_first_byte() {
        let mut r = BufReader::new(b"  [[1,\"2\"]]\n" as &[u8]);
        assert_eq!(detect_encoding(&mut r, None).await.unwrap(), Some(Encoding::Json));

        let mut r = BufReader::new(b"1000,2\n" as &[u8]);
        assert_eq!(detect_encoding(&mut r, None).await.unwrap(), Some(Encoding::Csv));

        let mut r = BufReader::new(b"1000,2\n" as &[u8]);
        assert_eq!(
            detect_encoding(&mut r, Some(Encoding::Json)).await.unwrap(),
            Some(Encoding::Json)
        );

        let mut r = BufReader::new(b"" as &[u8]);
        assert_eq!(detect_encoding(&mut r, None).await.unwrap(), None);

        let mut r = BufReader::new(b" \n\t\n" as &[u8]);
        assert_eq!(detect_encoding(&mut r, Some(Encoding::Csv)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn detect_encoding_reads_past_blank_chunks() {
        // The first chunk handed out is only a newline.
        let input = (b"\n" as &[u8]).chain(b"[[1,\"1\"],[2,\"2\"]]\n" as &[u8]);
        let mut r = BufReader::new(input);
        assert_eq!(detect_encoding(&mut r, None).await.unwrap(), Some(Encoding::Json));
        let series = Encoding::Json.decode(&mut r).await.unwrap().unwrap();
        assert_eq!(series.len(), 2);

        let input = (b"\n\n" as &[u8]).chain(b"1000,1\n" as &[u8]);
        let mut r = BufReader::new(input);
        assert_eq!(
            detect_encoding(&mut r, Some(Encoding::Csv)).await.unwrap(),
            Some(Encoding::Csv)
        );
    }
}
