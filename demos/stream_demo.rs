//! Capture microphone audio, encode it to Opus, and send RTP datagrams
//! to a local UDP port.
//!
//! Run with:
//! ```sh
//! RUST_LOG=info cargo run --example stream_demo
//! ```
//! Listen with any RTP-capable tool on 127.0.0.1:5004 (the printed SDP
//! fragment describes the stream).

use std::net::UdpSocket;
use std::time::{Duration, Instant};

use anyhow::Result;
use crabstream::{AudioPacketizer, AudioPipeline, StreamConfig};

const TARGET: &str = "127.0.0.1:5004";
const RUN_FOR: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    env_logger::init();

    let config = StreamConfig::default();
    let mut pipeline = AudioPipeline::open(&config)?;
    let mut packetizer = AudioPacketizer::new(config.sample_rate, config.channels);

    println!("--- SDP media fragment ---");
    print!("{}", packetizer.make_sdp());
    println!("--------------------------");
    println!("streaming to {} for {:?}", TARGET, RUN_FOR);

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(TARGET)?;

    let mut frame = vec![0u8; 4000];
    let mut packets = 0u64;
    let deadline = Instant::now() + RUN_FOR;

    while Instant::now() < deadline {
        if let Some((used, pts)) = pipeline.copy_encoded(&mut frame) {
            packetizer.wrap(pts, &frame[..used], |datagram| {
                if let Err(e) = socket.send(datagram) {
                    log::warn!("UDP send failed: {}", e);
                }
            });
            packets += 1;
        }
    }

    pipeline.shutdown();
    println!("sent {} RTP packets", packets);
    Ok(())
}
