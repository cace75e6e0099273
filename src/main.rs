//! readlog
//!
//! Keeps track of what you read and what you want to read later.
//!
//! Messages are read one per line from stdin and each reply is written to
//! stdout. Memories are dumped periodically and once more at EOF.
//!
//! # Usage
//!
//! ```bash
//! readlog --dump ./.dump --dump-interval 30s
//! ```

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use readlog::{Message, ReadlogError, Robot, RobotConfig};

/// Reading log robot
#[derive(Parser, Debug)]
#[command(name = "readlog")]
#[command(about = "Remember what you read, bookmark what you will")]
#[command(version)]
struct Args {
    /// Dump file for the memories
    #[arg(long, env = "DUMP", default_value = "./.dump")]
    dump: PathBuf,

    /// How often to dump, e.g. "30s" or "5m"
    #[arg(long, default_value = "30s", value_parser = parse_interval)]
    dump_interval: Duration,

    /// Directory for published reading notes
    #[arg(long, default_value = "./notes")]
    publish_dir: PathBuf,
}

fn parse_interval(s: &str) -> readlog::Result<Duration> {
    let interval = humantime::parse_duration(s)
        .map_err(|e| ReadlogError::Config(format!("invalid dump interval `{}`: {}", s, e)))?;
    if interval.is_zero() {
        return Err(ReadlogError::Config("dump interval must be positive".into()));
    }
    Ok(interval)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so replies own stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = RobotConfig {
        dump_path: args.dump,
        dump_interval: args.dump_interval,
        publish_dir: args.publish_dir,
    };

    let mut robot = Robot::new(config);
    robot.start().await?;
    tracing::info!("readlog robot started");

    run(&mut robot, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve messages until EOF, then stop the robot.
///
/// The robot is stopped even when the transport fails, so the final dump
/// still runs before the error is returned.
async fn run<R, W>(robot: &mut Robot, input: R, output: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let served = serve(robot, input, output).await;
    if let Err(ref e) = served {
        tracing::error!(error = %e, "stdio transport failed, stopping");
    }

    robot.stop().await?;
    tracing::info!("readlog robot stopped");

    Ok(served?)
}

/// Answer one message per input line
async fn serve<R, W>(robot: &mut Robot, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(input).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message = Message::new(line, Utc::now());
        tracing::info!(text = %message.text, "message received");

        let reply = robot.respond(&message).await;
        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }

    Ok(())
}
