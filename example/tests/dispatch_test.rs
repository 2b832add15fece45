use amqp_gen_wire::{ClassMethod, Frame, FrameType, ProtocolError, WireReader, WireWriter};

use example_app::broker;
use example_app::generated::{self, Basic, Channel, Handlers, Queue, BASIC_CLASS, CHANNEL_CLASS, QUEUE_CLASS};
use example_app::Loopback;

fn on_declare_ok(conn: &mut Loopback, queue: &str, message_count: u32, consumer_count: u32) -> Result<(), ProtocolError> {
    conn.events.push(format!("declare-ok {} {} {}", queue, message_count, consumer_count));
    Ok(())
}

fn on_deliver(
    conn: &mut Loopback,
    consumer_tag: &str,
    delivery_tag: u64,
    redelivered: bool,
    _exchange: &str,
    routing_key: &str,
) -> Result<(), ProtocolError> {
    conn.events.push(format!("deliver {} {} {} {}", consumer_tag, delivery_tag, redelivered, routing_key));
    Ok(())
}

fn on_deliver_ack(
    conn: &mut Loopback,
    _consumer_tag: &str,
    delivery_tag: u64,
    _redelivered: bool,
    _exchange: &str,
    _routing_key: &str,
) -> Result<(), ProtocolError> {
    Basic::ack_resp(conn, delivery_tag, false)
}

fn on_deliver_fail(
    _conn: &mut Loopback,
    _consumer_tag: &str,
    _delivery_tag: u64,
    _redelivered: bool,
    _exchange: &str,
    _routing_key: &str,
) -> Result<(), ProtocolError> {
    Err(ProtocolError::Closed)
}

fn client_handlers() -> Handlers<Loopback> {
    let mut handlers: Handlers<Loopback> = Handlers::default();
    handlers.queue.declare_ok = Some(on_declare_ok);
    handlers.basic.deliver = Some(on_deliver);
    handlers
}

fn declare(conn: &mut Loopback) -> Result<(), ProtocolError> {
    Queue::declare_sync(conn, "jobs", false, true, false, false, false, None)
}

#[test]
fn test_sync_request_returns_on_reply() {
    let mut conn = Loopback::new(1, client_handlers());
    conn.push_inbound(&broker::queue_declare_ok(1, "jobs", 3, 1).unwrap());

    declare(&mut conn).unwrap();
    assert_eq!(conn.events, vec!["declare-ok jobs 3 1"]);
    assert_eq!(conn.sent.len(), 1);
    assert_eq!(conn.pending(), 0);
}

#[test]
fn test_unrelated_frames_are_dispatched_while_waiting() {
    let mut conn = Loopback::new(1, client_handlers());
    conn.push_inbound(&broker::basic_deliver(1, "ctag-1", 1, false, "", "jobs").unwrap());
    conn.push_inbound(&broker::heartbeat());
    conn.push_inbound(&broker::basic_deliver(1, "ctag-1", 2, true, "", "jobs").unwrap());
    conn.push_inbound(&broker::queue_declare_ok(1, "jobs", 0, 0).unwrap());
    conn.push_inbound(&broker::basic_deliver(1, "ctag-1", 3, false, "", "jobs").unwrap());

    declare(&mut conn).unwrap();
    assert_eq!(
        conn.events,
        vec![
            "deliver ctag-1 1 false jobs",
            "deliver ctag-1 2 true jobs",
            "declare-ok jobs 0 0",
        ]
    );

    // frames after the reply are left for the caller
    assert_eq!(
        conn.receive().unwrap(),
        Some(ClassMethod { class: BASIC_CLASS, method: Basic::DELIVER_METHOD })
    );
    assert_eq!(conn.receive().unwrap(), None);
}

#[test]
fn test_handlers_may_send_while_a_request_waits() {
    let mut handlers = client_handlers();
    handlers.basic.deliver = Some(on_deliver_ack);
    let mut conn = Loopback::new(1, handlers);
    conn.push_inbound(&broker::basic_deliver(1, "ctag-1", 42, false, "", "jobs").unwrap());
    conn.push_inbound(&broker::queue_declare_ok(1, "jobs", 0, 0).unwrap());

    declare(&mut conn).unwrap();

    // declare went out first, then the ack from inside the pump
    let ids: Vec<ClassMethod> = conn
        .sent
        .iter()
        .map(|bytes| {
            let frame = Frame::parse(bytes).unwrap();
            let (class_method, _) = frame.method_header().unwrap();
            class_method
        })
        .collect();
    assert_eq!(
        ids,
        vec![
            ClassMethod { class: QUEUE_CLASS, method: Queue::DECLARE_METHOD },
            ClassMethod { class: BASIC_CLASS, method: Basic::ACK_METHOD },
        ]
    );
}

#[test]
fn test_missing_reply_surfaces_closed() {
    let mut conn = Loopback::new(1, client_handlers());
    conn.push_inbound(&broker::basic_deliver(1, "ctag-1", 1, false, "", "jobs").unwrap());

    assert!(matches!(declare(&mut conn), Err(ProtocolError::Closed)));
    assert_eq!(conn.events, vec!["deliver ctag-1 1 false jobs"]);
}

#[test]
fn test_unbound_handler_aborts_the_request() {
    let mut handlers: Handlers<Loopback> = Handlers::default();
    handlers.queue.declare_ok = Some(on_declare_ok);
    let mut conn = Loopback::new(1, handlers);
    conn.push_inbound(&broker::basic_deliver(1, "ctag-1", 1, false, "", "jobs").unwrap());
    conn.push_inbound(&broker::queue_declare_ok(1, "jobs", 0, 0).unwrap());

    let err = declare(&mut conn).unwrap_err();
    assert!(
        matches!(err, ProtocolError::MethodNotImplemented { class_id: 60, method_id: 60 }),
        "got {:?}",
        err
    );
    assert!(conn.events.is_empty());
}

#[test]
fn test_handler_errors_propagate() {
    let mut handlers = client_handlers();
    handlers.basic.deliver = Some(on_deliver_fail);
    let mut conn = Loopback::new(1, handlers);
    conn.push_inbound(&broker::basic_deliver(1, "ctag-1", 1, false, "", "jobs").unwrap());
    conn.push_inbound(&broker::queue_declare_ok(1, "jobs", 0, 0).unwrap());

    assert!(matches!(declare(&mut conn), Err(ProtocolError::Closed)));
    // the reply was never reached
    assert!(conn.pending() > 0);
}

#[test]
fn test_non_method_frames_are_rejected() {
    let mut tx = WireWriter::new();
    tx.write_frame_header(FrameType::Body, 1);
    tx.write_u8(0);
    tx.update_frame_length();

    let mut conn = Loopback::new(1, client_handlers());
    conn.push_inbound(tx.extent());
    assert!(matches!(
        conn.receive(),
        Err(ProtocolError::UnexpectedFrame { frame_type: 3 })
    ));
}

#[test]
fn test_dispatch_unknown_ids() {
    let handlers: Handlers<Loopback> = Handlers::default();
    let mut conn = Loopback::new(1, handlers);

    let mut rx = WireReader::new(&[]);
    assert!(matches!(
        generated::dispatch(&mut conn, &handlers, 99, 1, &mut rx),
        Err(ProtocolError::UnknownClass { class_id: 99 })
    ));
    assert!(matches!(
        generated::dispatch(&mut conn, &handlers, QUEUE_CLASS, 99, &mut rx),
        Err(ProtocolError::UnknownMethod { class_id: 50, method_id: 99 })
    ));
    assert!(matches!(
        generated::dispatch(&mut conn, &handlers, CHANNEL_CLASS, Channel::FLOW_METHOD, &mut rx),
        Err(ProtocolError::MethodNotImplemented { class_id: 20, method_id: 20 })
    ));
}

#[test]
fn test_is_synchronous() {
    assert!(generated::is_synchronous(QUEUE_CLASS, Queue::DECLARE_METHOD).unwrap());
    assert!(generated::is_synchronous(QUEUE_CLASS, Queue::DECLARE_OK_METHOD).unwrap());
    assert!(!generated::is_synchronous(BASIC_CLASS, Basic::PUBLISH_METHOD).unwrap());
    assert!(!generated::is_synchronous(CHANNEL_CLASS, Channel::FLOW_OK_METHOD).unwrap());
    assert!(matches!(
        generated::is_synchronous(99, 1),
        Err(ProtocolError::UnknownClass { class_id: 99 })
    ));
    assert!(matches!(
        generated::is_synchronous(BASIC_CLASS, 7),
        Err(ProtocolError::UnknownMethod { class_id: 60, method_id: 7 })
    ));
}

#[test]
fn test_constants() {
    assert_eq!(generated::FRAME_END, 206);
    assert_eq!(generated::FRAME_MIN_SIZE, 4096);
    assert_eq!(generated::REPLY_SUCCESS, 200);
    assert_eq!(generated::NOT_FOUND, 404);
    assert_eq!(Basic::RETURN_METHOD, 50);
    assert!(Handlers::<Loopback>::default().basic.return_.is_none());
}
