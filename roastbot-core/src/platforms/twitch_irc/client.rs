//! src/platforms/twitch_irc/client.rs

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, split};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_native_tls::TlsConnector;
use tokio_native_tls::native_tls;
use tracing::{debug, error, info};

use roastbot_common::models::{ChatMessage, ChatUser};

use crate::Error;
use crate::platforms::ChatTransport;

pub const TWITCH_IRC_HOST: &str = "irc.chat.twitch.tv";
pub const TWITCH_IRC_TLS_PORT: u16 = 6697;

/// Minimal representation of a parsed IRC line from Twitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIrcLine {
    pub tags: Option<String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl ParsedIrcLine {
    pub fn parse(line: &str) -> Self {
        let mut rest = line.trim();
        let mut tags = None;
        let mut prefix = None;
        let mut params = Vec::new();
        let mut trailing = None;

        if rest.starts_with('@') {
            match rest.split_once(' ') {
                Some((t, r)) => {
                    tags = Some(t.to_string());
                    rest = r;
                }
                None => {
                    return Self {
                        tags: Some(rest.to_string()),
                        prefix: None,
                        command: String::new(),
                        params,
                        trailing,
                    };
                }
            }
        }

        if let Some(stripped) = rest.strip_prefix(':') {
            match stripped.split_once(' ') {
                Some((p, r)) => {
                    prefix = Some(p.to_string());
                    rest = r;
                }
                None => {
                    return Self {
                        tags,
                        prefix: Some(stripped.to_string()),
                        command: String::new(),
                        params,
                        trailing,
                    };
                }
            }
        }

        let (command, rest) = rest.split_once(' ').unwrap_or((rest, ""));

        let middle = if let Some(t) = rest.strip_prefix(':') {
            trailing = Some(t.to_string());
            ""
        } else if let Some((m, t)) = rest.split_once(" :") {
            trailing = Some(t.to_string());
            m
        } else {
            rest
        };
        params.extend(middle.split_whitespace().map(str::to_string));

        Self {
            tags,
            prefix,
            command: command.to_string(),
            params,
            trailing,
        }
    }

    /// Turns a PRIVMSG into the transport-neutral chat message, `None` for anything else.
    pub fn to_chat_message(&self) -> Option<ChatMessage> {
        if !self.command.eq_ignore_ascii_case("PRIVMSG") {
            return None;
        }
        let channel = self.params.first()?.trim_start_matches('#').to_string();
        let text = self.trailing.clone()?;

        let login = self
            .prefix
            .as_deref()
            .and_then(|p| p.split_once('!').map(|(nick, _)| nick))
            .unwrap_or_default()
            .to_lowercase();
        let display_name = self
            .tags
            .as_deref()
            .and_then(|t| extract_tag_value(t, "display-name"))
            .filter(|dn| !dn.is_empty())
            .unwrap_or_else(|| login.clone());

        Some(ChatMessage::new(channel, ChatUser::new(login, display_name), text))
    }
}

/// Helper to extract `key=value` from a tag string like `@badge-info=;user-id=1234;...`
fn extract_tag_value(tag_str: &str, key: &str) -> Option<String> {
    tag_str
        .trim_start_matches('@')
        .split(';')
        .filter_map(|kv| kv.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

/// Twitch IRC connection over TLS. Incoming PRIVMSGs come out of the receiver returned
/// by [`TwitchIrcClient::connect`]; everything else except PING is dropped.
pub struct TwitchIrcClient {
    raw_outgoing: mpsc::UnboundedSender<String>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TwitchIrcClient {
    /// Connects to `irc.chat.twitch.tv:6697`, does PASS/NICK/CAP, and spawns the
    /// read/write tasks.
    pub async fn connect(
        username: &str,
        oauth_token: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChatMessage>), Error> {
        let tcp = TcpStream::connect((TWITCH_IRC_HOST, TWITCH_IRC_TLS_PORT))
            .await
            .map_err(|e| Error::Transport(format!("TCP connect error: {e}")))?;

        let native_connector = native_tls::TlsConnector::new()
            .map_err(|e| Error::Transport(format!("TLSConnector::new() => {e}")))?;
        let connector = TlsConnector::from(native_connector);
        let tls_stream = connector
            .connect(TWITCH_IRC_HOST, tcp)
            .await
            .map_err(|e| Error::Transport(format!("TLS connect() => {e}")))?;

        let (read_half, write_half) = split(tls_stream);

        let (tx_outgoing, rx_outgoing) = mpsc::unbounded_channel::<String>();
        let (tx_incoming, rx_incoming) = mpsc::unbounded_channel::<ChatMessage>();

        let write_task = tokio::spawn(writer_loop(write_half, rx_outgoing));

        let token = if oauth_token.starts_with("oauth:") {
            oauth_token.to_string()
        } else {
            format!("oauth:{oauth_token}")
        };
        tx_outgoing.send(format!("PASS {token}")).ok();
        tx_outgoing.send(format!("NICK {}", username.to_lowercase())).ok();
        tx_outgoing
            .send("CAP REQ :twitch.tv/commands twitch.tv/tags twitch.tv/membership".to_string())
            .ok();

        let read_task = tokio::spawn(reader_loop(read_half, tx_incoming, tx_outgoing.clone()));

        info!("(TwitchIrcClient) connected as '{}'", username);
        Ok((
            Self {
                raw_outgoing: tx_outgoing,
                tasks: Mutex::new(vec![read_task, write_task]),
            },
            rx_incoming,
        ))
    }

    fn send_raw_line(&self, line: String) -> Result<(), Error> {
        self.raw_outgoing
            .send(line)
            .map_err(|_| Error::Transport("IRC writer has shut down".into()))
    }
}

#[async_trait]
impl ChatTransport for TwitchIrcClient {
    async fn join_channel(&self, channel: &str) -> Result<(), Error> {
        self.send_raw_line(format!("JOIN #{}", channel.trim_start_matches('#')))
    }

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error> {
        self.send_raw_line(privmsg_line(channel, text))
    }

    async fn disconnect(&self) -> Result<(), Error> {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.abort();
        }
        info!("(TwitchIrcClient) disconnected");
        Ok(())
    }
}

/// Frames one chat line. CR and LF become spaces so the text stays a single IRC line.
fn privmsg_line(channel: &str, text: &str) -> String {
    let text: String = text
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    format!("PRIVMSG #{} :{}", channel.trim_start_matches('#'), text)
}

async fn reader_loop<R>(
    read_half: R,
    tx_incoming: mpsc::UnboundedSender<ChatMessage>,
    tx_outgoing: mpsc::UnboundedSender<String>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut reader = BufReader::new(read_half);
    let mut line_buffer = String::new();

    loop {
        line_buffer.clear();
        match reader.read_line(&mut line_buffer).await {
            Ok(0) => {
                info!("(TwitchIrcClient) read_loop => EOF");
                break;
            }
            Ok(_) => {
                let line = line_buffer.trim_end();
                if line.is_empty() {
                    continue;
                }
                debug!("<< {}", line);

                let parsed = ParsedIrcLine::parse(line);
                if parsed.command.eq_ignore_ascii_case("PING") {
                    let trail = parsed.trailing.unwrap_or_default();
                    tx_outgoing.send(format!("PONG :{}", trail)).ok();
                    continue;
                }

                if let Some(msg) = parsed.to_chat_message() {
                    if tx_incoming.send(msg).is_err() {
                        info!("(TwitchIrcClient) nobody listening for chat; stopping reader");
                        break;
                    }
                }
            }
            Err(e) => {
                error!("(TwitchIrcClient) read error => {:?}", e);
                break;
            }
        }
    }
}

async fn writer_loop<W>(write_half: W, mut rx_outgoing: mpsc::UnboundedReceiver<String>)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(write_half);

    while let Some(line) = rx_outgoing.recv().await {
        if line.starts_with("PASS ") {
            debug!(">> PASS ***");
        } else {
            debug!(">> {}", line);
        }
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\r\n").await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = written {
            error!("writer error => {:?}", e);
            break;
        }
    }

    info!("(TwitchIrcClient) writer_loop ended.");
}
