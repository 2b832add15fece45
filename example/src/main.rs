// example/src/main.rs

use amqp_gen_wire::{FieldValue, Frame, ProtocolError, Table};
use tracing_subscriber::EnvFilter;

use example_app::broker;
use example_app::generated::{Basic, Handlers, Queue};
use example_app::Loopback;

fn on_declare_ok(conn: &mut Loopback, queue: &str, message_count: u32, consumer_count: u32) -> Result<(), ProtocolError> {
    tracing::info!(queue, message_count, consumer_count, "queue declared");
    conn.events.push(format!("declared {}", queue));
    Ok(())
}

fn on_consume_ok(conn: &mut Loopback, consumer_tag: &str) -> Result<(), ProtocolError> {
    conn.events.push(format!("consuming as {}", consumer_tag));
    Ok(())
}

fn on_deliver(
    conn: &mut Loopback,
    consumer_tag: &str,
    delivery_tag: u64,
    redelivered: bool,
    exchange: &str,
    routing_key: &str,
) -> Result<(), ProtocolError> {
    tracing::info!(consumer_tag, delivery_tag, redelivered, exchange, routing_key, "delivery");
    conn.events.push(format!("delivery {} on {}", delivery_tag, routing_key));
    // acknowledge straight away
    Basic::ack_resp(conn, delivery_tag, false)
}

fn main() -> Result<(), ProtocolError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut handlers: Handlers<Loopback> = Handlers::default();
    handlers.queue.declare_ok = Some(on_declare_ok);
    handlers.basic.consume_ok = Some(on_consume_ok);
    handlers.basic.deliver = Some(on_deliver);

    let channel = 1;
    let mut conn = Loopback::new(channel, handlers);

    // What the broker will answer with, in order.
    conn.push_inbound(&broker::queue_declare_ok(channel, "jobs", 0, 0)?);
    conn.push_inbound(&broker::basic_deliver(channel, "ctag-1", 1, false, "", "jobs")?);
    conn.push_inbound(&broker::basic_consume_ok(channel, "ctag-1")?);

    let mut arguments = Table::new();
    arguments.insert("x-queue-type", "classic");
    arguments.insert("x-max-length", FieldValue::I32(1000));

    Queue::declare_sync(&mut conn, "jobs", false, true, false, false, false, Some(&arguments))?;
    Basic::publish_resp(&mut conn, "", "jobs", false, false)?;
    // the delivery is handled while waiting for consume-ok
    Basic::consume_sync(&mut conn, "jobs", "ctag-1", false, false, false, false, None)?;

    for event in &conn.events {
        println!("{}", event);
    }
    for bytes in &conn.sent {
        let frame = Frame::parse(bytes)?;
        let (class_method, rx) = frame.method_header()?;
        println!(
            "sent class {} method {} ({} argument bytes)",
            class_method.class,
            class_method.method,
            rx.remaining()
        );
    }
    Ok(())
}
