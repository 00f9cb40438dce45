use std::{io::ErrorKind, path::Path};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader},
};

/// Reads every line of a file while holding a shared lock. Returns `None` if the file doesn't
/// exist yet.
pub async fn read_lines_shared(path: &Path) -> Result<Option<Vec<String>>, io::Error> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    file.lock_shared()?;

    let mut lines = BufReader::new(file).lines();
    let mut result = vec![];
    let read: Result<(), io::Error> = async {
        while let Some(line) = lines.next_line().await? {
            result.push(line);
        }
        Ok(())
    }
    .await;

    lines.into_inner().into_inner().unlock_async().await?;
    read.map(|_| Some(result))
}

/// Reads a whole file while holding a shared lock. Returns `None` if the file doesn't exist yet.
pub async fn read_shared(path: &Path) -> Result<Option<Vec<u8>>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    file.lock_shared()?;

    let mut contents = vec![];
    let read = file.read_to_end(&mut contents).await;

    file.unlock_async().await?;
    read.map(|_| Some(contents))
}

/// Replaces the contents of a file while holding an exclusive lock. Creates the file if needed.
pub async fn rewrite_exclusive(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;
    // Truncation happens under the lock so readers never see a half written file.
    file.lock_exclusive()?;

    let written: Result<(), io::Error> = async {
        file.set_len(0).await?;
        file.rewind().await?;
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;

    file.unlock_async().await?;
    written
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{read_lines_shared, read_shared, rewrite_exclusive};

    #[tokio::test]
    async fn missing_file_reads_as_none() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_lines_shared(&dir.path().join("absent")).await?, None);
        assert_eq!(read_shared(&dir.path().join("absent")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn rewrite_replaces_longer_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("log");

        rewrite_exclusive(&path, b"first line\nsecond line\nthird line\n").await?;
        rewrite_exclusive(&path, b"short\n").await?;

        assert_eq!(
            read_lines_shared(&path).await?,
            Some(vec!["short".to_string()])
        );
        Ok(())
    }

    #[tokio::test]
    async fn rewrite_to_empty() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("log");

        rewrite_exclusive(&path, b"line\n").await?;
        rewrite_exclusive(&path, b"").await?;

        assert_eq!(read_lines_shared(&path).await?, Some(vec![]));
        assert_eq!(read_shared(&path).await?, Some(vec![]));
        Ok(())
    }
}
