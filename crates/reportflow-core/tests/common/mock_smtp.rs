/// Scripted in-process SMTP server for transport tests
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

/// DER certificate of the CA that signed the server certificate
pub const TEST_CA_DER: &[u8] = include_bytes!("../fixtures/test-ca.der");
const SERVER_CERT_DER: &[u8] = include_bytes!("../fixtures/localhost.der");
const SERVER_KEY_DER: &[u8] = include_bytes!("../fixtures/localhost.key.der");

/// How the server behaves on one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScript {
    Accept,
    RejectAuth,
    RejectRcpt,
    DropAfterGreeting,
    /// Advertises STARTTLS, then refuses to start it
    StartTlsUnavailable,
    /// Advertises STARTTLS and upgrades with the `localhost` test certificate
    StartTls,
}

/// A message the server accepted
#[derive(Debug, Clone, Default)]
pub struct ReceivedMail {
    pub auth: Option<String>,
    pub mail_from: String,
    pub rcpt_to: Vec<String>,
    pub data: String,
    /// EHLO commands seen on the connection, before and after any upgrade
    pub ehlo_count: usize,
    /// Whether the transaction ran over TLS
    pub tls: bool,
    /// Whether AUTH arrived after the TLS handshake
    pub auth_over_tls: bool,
}

pub struct MockSmtpServer {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<ReceivedMail>>>,
    handle: JoinHandle<()>,
}

impl MockSmtpServer {
    /// Starts a server that picks a script from the 0-based connection index
    pub async fn start<F>(script: F) -> Self
    where
        F: Fn(usize) -> SessionScript + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(script);
        let acceptor = tls_acceptor();

        let handle = {
            let connections = connections.clone();
            let received = received.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let index = connections.fetch_add(1, Ordering::SeqCst);
                    let behavior = script(index);
                    let received = received.clone();
                    let acceptor = acceptor.clone();
                    tokio::spawn(async move {
                        let _ = serve(stream, behavior, acceptor, received).await;
                    });
                }
            })
        };

        Self {
            addr,
            connections,
            received,
            handle,
        }
    }

    /// Server that accepts every session
    pub async fn accepting() -> Self {
        Self::start(|_| SessionScript::Accept).await
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<ReceivedMail> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for MockSmtpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn tls_acceptor() -> TlsAcceptor {
    let cert = CertificateDer::from(SERVER_CERT_DER.to_vec());
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(SERVER_KEY_DER.to_vec()));
    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
    TlsAcceptor::from(Arc::new(config))
}

async fn serve(
    mut stream: TcpStream,
    script: SessionScript,
    acceptor: TlsAcceptor,
    received: Arc<Mutex<Vec<ReceivedMail>>>,
) -> std::io::Result<()> {
    stream.write_all(b"220 mock.smtp ESMTP ready\r\n").await?;
    if script == SessionScript::DropAfterGreeting {
        return Ok(());
    }

    let mut mail = ReceivedMail::default();
    if let Some(plain) = converse(stream, script, &mut mail, &received).await? {
        let tls = acceptor.accept(plain).await?;
        mail.tls = true;
        converse(tls, script, &mut mail, &received).await?;
    }
    Ok(())
}

/// Answers commands until the client quits. Hands the stream back when the
/// client starts TLS.
async fn converse<S>(
    stream: S,
    script: SessionScript,
    mail: &mut ReceivedMail,
    received: &Mutex<Vec<ReceivedMail>>,
) -> std::io::Result<Option<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let command = line.trim_end().to_string();
        let upper = command.to_ascii_uppercase();

        let reply: &str = if upper.starts_with("EHLO") {
            mail.ehlo_count += 1;
            match script {
                SessionScript::StartTlsUnavailable => {
                    "250-mock.smtp\r\n250-STARTTLS\r\n250 AUTH PLAIN\r\n"
                }
                SessionScript::StartTls if !mail.tls => {
                    "250-mock.smtp\r\n250-STARTTLS\r\n250-AUTH PLAIN\r\n250 8BITMIME\r\n"
                }
                _ => "250-mock.smtp\r\n250-AUTH PLAIN\r\n250 8BITMIME\r\n",
            }
        } else if upper == "STARTTLS" {
            if script == SessionScript::StartTls && !mail.tls {
                writer.write_all(b"220 2.0.0 ready to start TLS\r\n").await?;
                writer.flush().await?;
                return Ok(Some(reader.into_inner().unsplit(writer)));
            }
            "454 4.7.0 TLS not available\r\n"
        } else if upper.starts_with("AUTH PLAIN ") {
            mail.auth = Some(command["AUTH PLAIN ".len()..].to_string());
            mail.auth_over_tls = mail.tls;
            if script == SessionScript::RejectAuth {
                "535 5.7.8 authentication failed\r\n"
            } else {
                "235 2.7.0 authentication succeeded\r\n"
            }
        } else if upper.starts_with("MAIL FROM:") {
            mail.mail_from = angle_address(&command);
            "250 2.1.0 OK\r\n"
        } else if upper.starts_with("RCPT TO:") {
            mail.rcpt_to.push(angle_address(&command));
            if script == SessionScript::RejectRcpt {
                "550 5.1.1 no such user\r\n"
            } else {
                "250 2.1.5 OK\r\n"
            }
        } else if upper == "DATA" {
            writer.write_all(b"354 end data with <CR><LF>.<CR><LF>\r\n").await?;
            writer.flush().await?;
            mail.data = read_data(&mut reader).await?;
            received.lock().unwrap().push(mail.clone());
            "250 2.0.0 queued\r\n"
        } else if upper == "QUIT" {
            writer.write_all(b"221 2.0.0 bye\r\n").await?;
            writer.flush().await?;
            return Ok(None);
        } else {
            "500 5.5.2 command not recognized\r\n"
        };

        writer.write_all(reply.as_bytes()).await?;
        writer.flush().await?;
    }
}

async fn read_data<R>(reader: &mut R) -> std::io::Result<String>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut data = String::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(data);
        }
        if line == ".\r\n" {
            return Ok(data);
        }
        match line.strip_prefix('.') {
            Some(unstuffed) => data.push_str(unstuffed),
            None => data.push_str(&line),
        }
    }
}

fn angle_address(command: &str) -> String {
    match (command.find('<'), command.rfind('>')) {
        (Some(start), Some(end)) if start < end => command[start + 1..end].to_string(),
        _ => String::new(),
    }
}
