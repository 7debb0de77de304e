//! Hello-world pipeline: a timed greeting generator, a half-second delay,
//! and an ostreamer printing to stdout.
//!
//! Run with `cargo run --example hello_world`.

use conflux::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt::init();

    // Fire once a second.
    let timer = Arc::new(MonotonousTimer::new(Duration::from_secs(1)));

    let greeter = Arc::new(Producer::<String, _>::new(
        "greeter",
        1,
        Generator::new(&timer, || "Hello, world!".to_string()),
    ));
    let delay = Arc::new(Transformer::<String, String, _>::new(
        "delay",
        1,
        1,
        Delay::new(Duration::from_millis(500)),
    ));
    let printer = Arc::new(Consumer::<String, _>::new(
        "printer",
        1,
        Ostreamer::new(std::io::stdout()),
    ));

    let mut graph = Graph::with_name("hello_world");
    graph.add(greeter);
    graph.add(delay);
    graph.add(printer);
    graph.connect::<String>("greeter", 0, "delay", 0).unwrap();
    graph.connect::<String>("delay", 0, "printer", 0).unwrap();

    // The timer runs on its own thread so it doesn't block us here.
    let ticker = {
        let timer = Arc::clone(&timer);
        thread::spawn(move || timer.run())
    };

    // Greetings appear every second, each half a second after generation.
    graph.start();
    thread::sleep(Duration::from_secs(5));

    // Pause: generation stops, the last delayed greeting drains.
    graph.pause();
    thread::sleep(Duration::from_secs(2));

    // And back again.
    graph.start();
    thread::sleep(Duration::from_secs(3));

    graph.stop();
    timer.stop();
    ticker.join().unwrap();
}
