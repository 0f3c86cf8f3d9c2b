//! Bridge over real TCP sockets.

use conlog_bridge::{listen, BridgeConfig, SerialBridge};
use conlog_stream::{MemoryPort, TcpPeerListener};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn pump_until<F>(bridge: &mut SerialBridge<MemoryPort, TcpPeerListener>, mut cond: F)
where
    F: FnMut(&SerialBridge<MemoryPort, TcpPeerListener>) -> bool,
{
    let mut scratch = [0u8; 64];
    for _ in 0..400 {
        bridge.pump(&mut scratch);
        if cond(bridge) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn telnet_client_talks_to_serial_line() {
    let config = BridgeConfig::new("127.0.0.1:0".parse().unwrap());
    let listener = listen(&config).await.unwrap();
    let addr = listener.local_addr();

    let line = MemoryPort::new(256, 256);
    let mut bridge = SerialBridge::new(line.clone(), &config).unwrap();
    bridge.begin(listener, None);

    let mut client = TcpStream::connect(addr).await.unwrap();
    pump_until(&mut bridge, |b| b.is_connected()).await;
    assert!(bridge.is_connected());

    line.inject(b"U-Boot> ");
    pump_until(&mut bridge, |b| b.serial().rx().is_empty()).await;
    let mut prompt = [0u8; 8];
    client.read_exact(&mut prompt).await.unwrap();
    assert_eq!(&prompt, b"U-Boot> ");

    client.write_all(b"printenv\r").await.unwrap();
    let mut seen = Vec::new();
    pump_until(&mut bridge, |b| {
        seen.extend(b.serial().drain());
        seen.len() >= 9
    })
    .await;
    assert_eq!(seen, b"printenv\r");

    drop(client);
    pump_until(&mut bridge, |b| !b.is_connected()).await;
    assert!(!bridge.is_connected());
    assert_eq!(bridge.pool().occupied(), 0);
}

#[tokio::test]
async fn second_client_is_told_busy() {
    let config = BridgeConfig::new("127.0.0.1:0".parse().unwrap());
    let listener = listen(&config).await.unwrap();
    let addr = listener.local_addr();

    let mut bridge = SerialBridge::new(MemoryPort::new(64, 64), &config).unwrap();
    bridge.begin(listener, None);

    let _first = TcpStream::connect(addr).await.unwrap();
    pump_until(&mut bridge, |b| b.is_connected()).await;

    let mut second = TcpStream::connect(addr).await.unwrap();
    let mut reply = Vec::new();
    let read = tokio::spawn(async move {
        second.read_to_end(&mut reply).await.unwrap();
        reply
    });
    pump_until(&mut bridge, |_| read.is_finished()).await;

    assert_eq!(read.await.unwrap(), b"busy\r\n");
    assert_eq!(bridge.pool().occupied(), 1);
}
