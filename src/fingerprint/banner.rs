//! Passive banner grab
//!
//! Connects and says nothing: some services (SSH, FTP, SMTP) volunteer a
//! greeting on their own. Whatever arrives within the timeout window gets
//! pattern-matched; silence is a valid, unidentified outcome.

use crate::fingerprint::{patterns, ServiceFingerprint};
use crate::net::prober::BANNER_CAP;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Wait for an unsolicited banner on (addr, port) and match it.
pub async fn grab_banner(addr: IpAddr, port: u16, io_timeout: Duration) -> ServiceFingerprint {
    let mut banner = String::new();

    let grab = timeout(io_timeout, async {
        let mut stream = TcpStream::connect(SocketAddr::new(addr, port)).await?;

        let mut buf = [0u8; BANNER_CAP];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            let room = BANNER_CAP - banner.len();
            let take = n.min(room);
            banner.push_str(&String::from_utf8_lossy(&buf[..take]));
            if banner.len() >= BANNER_CAP {
                break;
            }
        }

        Ok::<(), std::io::Error>(())
    })
    .await;

    if let Ok(Err(e)) = grab {
        log::debug!("banner grab of {}:{} failed: {}", addr, port, e);
        return ServiceFingerprint::unidentified();
    }

    // Reaching the deadline with data in hand is the normal path here
    if banner.is_empty() {
        ServiceFingerprint::unidentified()
    } else {
        patterns::match_banner(&banner, port)
    }
}
