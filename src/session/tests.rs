//! Unit tests for the session state machine and frame pump.

use std::{
    io,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use rstest::{fixture, rstest};
use tracing_test::traced_test;

use super::*;
use crate::{
    codec::{FramingError, PacketCodec},
    packet::{
        AdminChat,
        AdminPing,
        PacketBody,
        ServerChat,
        ServerClientJoin,
        ServerDate,
        ServerPong,
        ServerWelcome,
    },
    routing::{HandlerRegistry, HandlerResult},
};

#[derive(Debug, Default)]
struct Wire {
    sent: Vec<Bytes>,
    closes: usize,
}

#[derive(Debug)]
struct RecordingTransport {
    wire: Arc<Mutex<Wire>>,
    progress: CloseProgress,
    fail_sends: bool,
}

impl RecordingTransport {
    fn new(progress: CloseProgress) -> (Self, Arc<Mutex<Wire>>) {
        let wire = Arc::new(Mutex::new(Wire::default()));
        let transport = Self {
            wire: wire.clone(),
            progress,
            fail_sends: false,
        };
        (transport, wire)
    }
}

impl Transport for RecordingTransport {
    fn peer_addr(&self) -> Option<SocketAddr> { "127.0.0.1:3977".parse().ok() }

    fn send(&mut self, bytes: Bytes) -> io::Result<()> {
        if self.fail_sends {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
        }
        self.wire.lock().expect("wire lock").sent.push(bytes);
        Ok(())
    }

    fn close(&mut self) -> io::Result<CloseProgress> {
        self.wire.lock().expect("wire lock").closes += 1;
        Ok(self.progress)
    }
}

fn sent_packets(wire: &Arc<Mutex<Wire>>) -> Vec<Packet> {
    let codec = PacketCodec::default();
    wire.lock()
        .expect("wire lock")
        .sent
        .iter()
        .map(|bytes| {
            codec
                .extract(bytes)
                .expect("valid frame")
                .expect("complete frame")
                .packet
        })
        .collect()
}

fn frame(packet: impl Into<Packet>) -> Bytes {
    PacketCodec::default()
        .encode(&packet.into())
        .expect("encode packet")
}

fn welcome() -> ServerWelcome {
    ServerWelcome {
        server_name: "Test Server".into(),
        map_name: "Random Map".into(),
        ..ServerWelcome::default()
    }
}

type Seen = Arc<Mutex<Vec<(Phase, Packet)>>>;

fn recording<P: PacketBody + Clone>(
    registry: HandlerRegistry,
    seen: &Seen,
) -> HandlerRegistry {
    let sink = seen.clone();
    registry
        .on::<P, _>(move |ctx, body| -> HandlerResult {
            sink.lock()
                .expect("seen lock")
                .push((ctx.phase(), body.clone().into()));
            Ok(())
        })
        .expect("register handler")
}

#[fixture]
fn seen() -> Seen { Arc::new(Mutex::new(Vec::new())) }

fn session_with(credentials: Credentials, handlers: HandlerRegistry) -> Session<RecordingTransport> {
    Session::builder()
        .credentials(credentials)
        .handlers(handlers)
        .build()
}

fn authenticated_session(
    handlers: HandlerRegistry,
) -> (Session<RecordingTransport>, Arc<Mutex<Wire>>) {
    let mut session = session_with(Credentials::new().password("secret"), handlers);
    let (transport, wire) = RecordingTransport::new(CloseProgress::Closed);
    session.connect(transport).expect("connect");
    session.receive(&frame(welcome())).expect("welcome");
    (session, wire)
}

fn close_counter(builder: SessionBuilder) -> (SessionBuilder, Arc<Mutex<Vec<String>>>) {
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let sink = reasons.clone();
    let builder = builder.on_close(move |reason| {
        sink.lock().expect("reasons lock").push(reason.to_string());
    });
    (builder, reasons)
}

#[test]
fn connect_with_password_sends_join_and_authenticates() {
    let mut session = session_with(
        Credentials::new().password("secret").name("testbot").version("3"),
        HandlerRegistry::new(),
    );
    let (transport, wire) = RecordingTransport::new(CloseProgress::Closed);

    session.connect(transport).expect("connect");

    assert_eq!(session.phase(), Phase::Authenticating);
    assert_eq!(session.peer_addr(), "127.0.0.1:3977".parse().ok());
    assert_eq!(
        sent_packets(&wire),
        vec![Packet::from(AdminJoin {
            password: "secret".into(),
            name: "testbot".into(),
            version: "3".into(),
        })]
    );
}

#[rstest]
#[case(Credentials::new())]
#[case(Credentials::new().password(""))]
fn connect_without_password_sends_nothing(#[case] credentials: Credentials) {
    let mut session = session_with(credentials, HandlerRegistry::new());
    let (transport, wire) = RecordingTransport::new(CloseProgress::Closed);

    session.connect(transport).expect("connect");

    assert_eq!(session.phase(), Phase::Connected);
    assert!(sent_packets(&wire).is_empty());
}

#[test]
fn connect_twice_is_rejected() {
    let mut session = session_with(Credentials::new(), HandlerRegistry::new());
    let (first, _) = RecordingTransport::new(CloseProgress::Closed);
    let (second, _) = RecordingTransport::new(CloseProgress::Closed);
    session.connect(first).expect("first connect");

    let err = session.connect(second).expect_err("second connect");
    assert!(matches!(
        err,
        SessionError::InvalidPhase {
            operation: Operation::Connect,
            phase: Phase::Connected,
        }
    ));
}

#[test]
fn manual_authentication_from_connected() {
    let mut session = session_with(Credentials::new(), HandlerRegistry::new());
    let (transport, wire) = RecordingTransport::new(CloseProgress::Closed);
    session.connect(transport).expect("connect");

    session
        .authenticate(Credentials::new().password("later"))
        .expect("authenticate");

    assert_eq!(session.phase(), Phase::Authenticating);
    assert_eq!(session.credentials().password_value(), Some("later"));
    assert!(matches!(
        sent_packets(&wire).as_slice(),
        [Packet::AdminJoin(join)] if join.password == "later"
    ));
}

#[test]
fn authentication_requires_a_password() {
    let mut session = session_with(Credentials::new(), HandlerRegistry::new());
    let (transport, _) = RecordingTransport::new(CloseProgress::Closed);
    session.connect(transport).expect("connect");

    let err = session
        .authenticate(Credentials::new())
        .expect_err("no password");
    assert!(matches!(err, SessionError::MissingPassword));
    assert_eq!(session.phase(), Phase::Connected);
}

#[test]
fn authentication_is_rejected_outside_connected() {
    let mut session = session_with(Credentials::new().password("secret"), HandlerRegistry::new());
    let (transport, _) = RecordingTransport::new(CloseProgress::Closed);
    session.connect(transport).expect("connect");

    let err = session
        .authenticate(Credentials::new().password("again"))
        .expect_err("already authenticating");
    assert!(matches!(
        err,
        SessionError::InvalidPhase {
            operation: Operation::Authenticate,
            phase: Phase::Authenticating,
        }
    ));
}

#[rstest]
fn welcome_completes_authentication_before_routing(seen: Seen) {
    let handlers = recording::<ServerWelcome>(HandlerRegistry::new(), &seen);
    let (session, _) = authenticated_session(handlers);

    assert_eq!(session.phase(), Phase::Authenticated);
    assert_eq!(
        *seen.lock().expect("seen lock"),
        vec![(Phase::Authenticated, Packet::from(welcome()))]
    );
}

#[rstest]
fn frames_in_one_chunk_route_in_order(seen: Seen) {
    let handlers = recording::<ServerDate>(HandlerRegistry::new(), &seen);
    let (mut session, _) = authenticated_session(handlers);
    let mut chunk = Vec::new();
    for date in [1, 2, 3] {
        chunk.extend_from_slice(&frame(ServerDate { date }));
    }

    assert_eq!(session.receive(&chunk).expect("receive"), 3);

    let dates: Vec<_> = seen
        .lock()
        .expect("seen lock")
        .iter()
        .map(|(_, packet)| packet.clone())
        .collect();
    assert_eq!(
        dates,
        vec![
            Packet::from(ServerDate { date: 1 }),
            Packet::from(ServerDate { date: 2 }),
            Packet::from(ServerDate { date: 3 }),
        ]
    );
    assert_eq!(session.buffered_len(), 0);
}

#[rstest]
fn byte_at_a_time_delivery_routes_once(seen: Seen) {
    let handlers = recording::<ServerChat>(HandlerRegistry::new(), &seen);
    let (mut session, _) = authenticated_session(handlers);
    let chat = ServerChat {
        client_id: 7,
        message: "hello".into(),
        ..ServerChat::default()
    };
    let bytes = frame(chat.clone());

    let (last, head) = bytes.split_last().expect("non-empty frame");
    for byte in head {
        assert_eq!(session.receive(std::slice::from_ref(byte)).expect("partial"), 0);
    }
    assert_eq!(session.buffered_len(), head.len());
    assert_eq!(session.receive(std::slice::from_ref(last)).expect("final"), 1);

    assert_eq!(
        *seen.lock().expect("seen lock"),
        vec![(Phase::Authenticated, Packet::from(chat))]
    );
}

#[test]
fn unknown_packets_are_skipped() {
    let (mut session, _) = authenticated_session(HandlerRegistry::new());
    let mut chunk = vec![5, 0, 200, 0xAA, 0xBB];
    chunk.extend_from_slice(&frame(ServerDate { date: 9 }));

    assert_eq!(session.receive(&chunk).expect("receive"), 2);
    assert_eq!(session.phase(), Phase::Authenticated);
}

#[rstest]
#[case::oversized(vec![0xFF, 0xFF, 104])]
#[case::undersized(vec![2, 0, 104])]
fn framing_errors_close_the_session(#[case] bytes: Vec<u8>) {
    let (builder, reasons) = close_counter(
        Session::builder().credentials(Credentials::new().password("secret")),
    );
    let mut session = builder.build();
    let (transport, wire) = RecordingTransport::new(CloseProgress::Pending);
    session.connect(transport).expect("connect");

    let err = session.receive(&bytes).expect_err("framing error");

    assert!(matches!(err, SessionError::Codec(CodecError::Framing(_))));
    assert_eq!(session.phase(), Phase::Closed);
    assert!(matches!(session.close_reason(), Some(CloseReason::Codec(_))));
    assert_eq!(wire.lock().expect("wire lock").closes, 1);
    assert_eq!(reasons.lock().expect("reasons lock").len(), 1);

    session.on_transport_closed(None);
    assert_eq!(reasons.lock().expect("reasons lock").len(), 1);
}

#[test]
fn oversized_error_reports_declared_size() {
    let mut session: Session<RecordingTransport> = Session::builder().max_packet_size(64).build();
    let (transport, _) = RecordingTransport::new(CloseProgress::Closed);
    session.connect(transport).expect("connect");

    let err = session.receive(&[100, 0, 107]).expect_err("oversized");
    assert!(matches!(
        err,
        SessionError::Codec(CodecError::Framing(FramingError::OversizedFrame { size: 100, max: 64 }))
    ));
}

#[test]
fn frames_before_a_codec_error_are_routed() {
    let calls = Arc::new(Mutex::new(0));
    let count = calls.clone();
    let handlers = HandlerRegistry::new()
        .on::<ServerDate, _>(move |_, _| {
            *count.lock().expect("count lock") += 1;
            Ok(())
        })
        .expect("register");
    let (mut session, _) = authenticated_session(handlers);
    let mut chunk = frame(ServerDate { date: 1 }).to_vec();
    chunk.extend_from_slice(&[1, 0, 107]);

    session.receive(&chunk).expect_err("second frame is malformed");
    assert_eq!(*calls.lock().expect("count lock"), 1);
    assert_eq!(session.phase(), Phase::Closed);
}

#[test]
fn handler_error_leaves_later_frames_buffered() {
    let dates = Arc::new(Mutex::new(Vec::new()));
    let sink = dates.clone();
    let handlers = HandlerRegistry::new()
        .on::<ServerDate, _>(move |_, date| {
            sink.lock().expect("dates lock").push(date.date);
            if date.date == 1 {
                return Err("first date rejected".into());
            }
            Ok(())
        })
        .expect("register");
    let (mut session, _) = authenticated_session(handlers);
    let mut chunk = Vec::new();
    for date in [1, 2, 3] {
        chunk.extend_from_slice(&frame(ServerDate { date }));
    }

    let err = session.receive(&chunk).expect_err("handler error");
    assert!(matches!(err, SessionError::Handler { packet: "ServerDate", .. }));
    assert_eq!(session.phase(), Phase::Authenticated);
    assert_eq!(*dates.lock().expect("dates lock"), vec![1]);
    assert_eq!(session.buffered_len(), 2 * frame(ServerDate { date: 2 }).len());

    assert_eq!(session.receive(&[]).expect("resume"), 2);
    assert_eq!(*dates.lock().expect("dates lock"), vec![1, 2, 3]);
}

#[test]
fn handler_replies_are_sent() {
    let handlers = HandlerRegistry::new()
        .on::<ServerPong, _>(|ctx, pong| {
            ctx.send(AdminPing {
                payload: pong.payload + 1,
            });
            Ok(())
        })
        .expect("register");
    let (mut session, wire) = authenticated_session(handlers);

    session
        .receive(&frame(ServerPong { payload: 41 }))
        .expect("receive");

    assert_eq!(
        sent_packets(&wire).last(),
        Some(&Packet::from(AdminPing { payload: 42 }))
    );
}

#[test]
fn handler_disconnect_discards_remaining_frames() {
    let calls = Arc::new(Mutex::new(0));
    let count = calls.clone();
    let handlers = HandlerRegistry::new()
        .on::<ServerClientJoin, _>(move |ctx, _| {
            *count.lock().expect("count lock") += 1;
            ctx.disconnect();
            Ok(())
        })
        .expect("register");
    let (mut session, wire) = authenticated_session(handlers);
    let mut chunk = frame(ServerClientJoin { client_id: 1 }).to_vec();
    chunk.extend_from_slice(&frame(ServerClientJoin { client_id: 2 }));

    assert_eq!(session.receive(&chunk).expect("receive"), 1);

    assert_eq!(*calls.lock().expect("count lock"), 1);
    assert_eq!(session.phase(), Phase::Closed);
    assert!(matches!(session.close_reason(), Some(CloseReason::Requested)));
    assert!(matches!(
        sent_packets(&wire).last(),
        Some(Packet::AdminQuit(_))
    ));
}

#[test]
fn disconnect_with_synchronous_close() {
    let (builder, reasons) = close_counter(Session::builder());
    let mut session = builder.build();
    let (transport, wire) = RecordingTransport::new(CloseProgress::Closed);
    session.connect(transport).expect("connect");

    session.disconnect();

    assert_eq!(session.phase(), Phase::Closed);
    assert!(session.transport().is_none());
    assert!(matches!(sent_packets(&wire).as_slice(), [Packet::AdminQuit(_)]));
    assert_eq!(wire.lock().expect("wire lock").closes, 1);
    assert_eq!(
        *reasons.lock().expect("reasons lock"),
        vec!["closed by client".to_owned()]
    );
}

#[test]
fn disconnect_with_pending_close_waits_for_transport() {
    let (builder, reasons) = close_counter(Session::builder());
    let mut session = builder.build();
    let (transport, _) = RecordingTransport::new(CloseProgress::Pending);
    session.connect(transport).expect("connect");

    session.disconnect();
    assert_eq!(session.phase(), Phase::Closing);
    assert!(reasons.lock().expect("reasons lock").is_empty());

    assert_eq!(session.receive(&frame(ServerDate { date: 1 })).expect("discard"), 0);
    assert_eq!(session.buffered_len(), 0);

    session.disconnect();
    assert_eq!(session.phase(), Phase::Closing);

    session.on_transport_closed(None);
    assert_eq!(session.phase(), Phase::Closed);
    assert!(matches!(session.close_reason(), Some(CloseReason::Requested)));
    assert_eq!(reasons.lock().expect("reasons lock").len(), 1);
}

#[test]
fn disconnect_before_connect_closes_immediately() {
    let (builder, reasons) = close_counter(Session::builder());
    let mut session: Session<RecordingTransport> = builder.build();

    session.disconnect();
    session.disconnect();

    assert_eq!(session.phase(), Phase::Closed);
    assert_eq!(reasons.lock().expect("reasons lock").len(), 1);
}

#[test]
fn disconnect_survives_a_failed_quit() {
    let mut session: Session<RecordingTransport> = Session::builder().build();
    let (mut transport, wire) = RecordingTransport::new(CloseProgress::Closed);
    transport.fail_sends = true;
    session.connect(transport).expect("connect");

    session.disconnect();

    assert_eq!(session.phase(), Phase::Closed);
    assert_eq!(wire.lock().expect("wire lock").closes, 1);
}

#[test]
fn transport_loss_closes_with_the_error() {
    let (builder, reasons) = close_counter(Session::builder());
    let mut session = builder.build();
    let (transport, _) = RecordingTransport::new(CloseProgress::Closed);
    session.connect(transport).expect("connect");

    session.on_transport_closed(Some(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "reset by peer",
    )));

    assert_eq!(session.phase(), Phase::Closed);
    assert!(matches!(
        session.close_reason(),
        Some(CloseReason::Lost(Some(err))) if err.kind() == io::ErrorKind::ConnectionReset
    ));
    assert_eq!(reasons.lock().expect("reasons lock").len(), 1);
}

#[rstest]
#[case::receive(Operation::Receive)]
#[case::send(Operation::Send)]
fn closed_sessions_reject_io(#[case] operation: Operation) {
    let mut session: Session<RecordingTransport> = Session::builder().build();
    let (transport, _) = RecordingTransport::new(CloseProgress::Closed);
    session.connect(transport).expect("connect");
    session.on_transport_closed(None);

    let err = match operation {
        Operation::Receive => session.receive(&[1, 2, 3]).expect_err("receive"),
        _ => session
            .send(&Packet::from(AdminChat::broadcast("late")))
            .expect_err("send"),
    };
    assert!(matches!(
        err,
        SessionError::InvalidPhase { operation: op, phase: Phase::Closed } if op == operation
    ));
}

#[test]
fn receive_before_connect_is_rejected() {
    let mut session: Session<RecordingTransport> = Session::builder().build();
    assert!(matches!(
        session.receive(&[3, 0, 104]),
        Err(SessionError::InvalidPhase {
            operation: Operation::Receive,
            phase: Phase::Disconnected,
        })
    ));
}

#[test]
fn unencodable_packets_leave_the_session_open() {
    let (mut session, wire) = authenticated_session(HandlerRegistry::new());
    let before = sent_packets(&wire).len();

    let err = session
        .send(&Packet::from(AdminChat::broadcast("nul\0inside")))
        .expect_err("interior nul");

    assert!(matches!(err, SessionError::Codec(CodecError::Encode(_))));
    assert_eq!(session.phase(), Phase::Authenticated);
    assert_eq!(sent_packets(&wire).len(), before);
}

#[rstest]
#[case::unencodable(Credentials::new().password("a\0b"), false)]
#[case::refused(Credentials::new().password("secret"), true)]
fn failed_join_detaches_the_transport(#[case] credentials: Credentials, #[case] fail_sends: bool) {
    let mut session = session_with(credentials, HandlerRegistry::new());
    let (mut transport, wire) = RecordingTransport::new(CloseProgress::Closed);
    transport.fail_sends = fail_sends;

    session.connect(transport).expect_err("join fails");

    assert_eq!(session.phase(), Phase::Disconnected);
    assert!(session.transport().is_none());
    assert_eq!(session.peer_addr(), None);
    assert_eq!(wire.lock().expect("wire lock").closes, 1);
    assert!(sent_packets(&wire).is_empty());
}

#[test]
fn transport_send_failures_surface() {
    let mut session: Session<RecordingTransport> = Session::builder().build();
    let (mut transport, _) = RecordingTransport::new(CloseProgress::Closed);
    transport.fail_sends = true;
    session.connect(transport).expect("connect");

    let err = session
        .send(&Packet::from(AdminChat::broadcast("hi")))
        .expect_err("send fails");
    assert!(matches!(err, SessionError::Transport(e) if e.kind() == io::ErrorKind::BrokenPipe));
    assert_eq!(session.phase(), Phase::Connected);
}

#[traced_test]
#[test]
fn lifecycle_is_logged() {
    let (mut session, _) = authenticated_session(HandlerRegistry::new());
    session.disconnect();

    assert!(logs_contain("connection made"));
    assert!(logs_contain("automatically authenticating"));
    assert!(logs_contain("authenticated"));
    assert!(logs_contain("connection closed"));
}
