//! Multiplier pipeline with a custom node: two counting generators feed a
//! transformer that multiplies its inputs and emits the whole expression as
//! a string, e.g. "3 * 4 = 12".
//!
//! Run with `cargo run --example multiplier`.

use conflux::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Multiplies one packet from every input and emits the expression.
///
/// Consumes u64, produces String: a heterogeneous transformer.
struct MultiplicationExpressifier;

impl Transform<u64, String> for MultiplicationExpressifier {
    fn ready(&self, _index: usize, inputs: &[InPin<u64>], outputs: &[OutPin<String>]) {
        // Act only when every factor has arrived.
        if !inputs.iter().all(InPin::peek) {
            return;
        }

        let mut factors = Vec::with_capacity(inputs.len());
        for input in inputs {
            match input.pop() {
                Some(packet) => factors.push(packet.into_data()),
                None => return,
            }
        }

        let product: u64 = factors.iter().product();
        let expression = factors
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(" * ");

        let _ = outputs[0].push(Packet::new(format!("{expression} = {product}")));
    }
}

fn counting(start: u64, step: u64) -> impl Fn() -> u64 + Send + Sync {
    let next = AtomicU64::new(start);
    move || next.fetch_add(step, Ordering::Relaxed)
}

fn main() {
    tracing_subscriber::fmt::init();

    let timer = Arc::new(MonotonousTimer::new(Duration::from_secs(1)));

    let odd = Arc::new(Producer::<u64, _>::new(
        "odd",
        1,
        Generator::new(&timer, counting(1, 2)),
    ));
    let even = Arc::new(Producer::<u64, _>::new(
        "even",
        1,
        Generator::new(&timer, counting(2, 2)),
    ));
    let multiplier = Arc::new(Transformer::<u64, String, _>::new(
        "multiplier",
        2,
        1,
        MultiplicationExpressifier,
    ));
    let printer = Arc::new(Consumer::<String, _>::new(
        "printer",
        1,
        Ostreamer::new(std::io::stdout()),
    ));

    let mut graph = Graph::with_name("multiplier");
    graph.add(odd);
    graph.add(even);
    graph.add(multiplier);
    graph.add(printer);
    graph.connect::<u64>("odd", 0, "multiplier", 0).unwrap();
    graph.connect::<u64>("even", 0, "multiplier", 1).unwrap();
    graph.connect::<String>("multiplier", 0, "printer", 0).unwrap();

    // Show the wiring before running it.
    graph.to_dot(&mut std::io::stdout()).unwrap();

    let ticker = {
        let timer = Arc::clone(&timer);
        thread::spawn(move || timer.run())
    };

    graph.start();
    thread::sleep(Duration::from_secs(6));
    graph.stop();

    timer.stop();
    ticker.join().unwrap();
}
