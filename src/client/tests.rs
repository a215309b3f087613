//! Unit tests for the admin port client runtime.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use rstest::rstest;
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_util::codec::Framed;

use super::*;
use crate::{
    codec::PacketCodec,
    packet::{AdminChat, Packet, ServerDate, ServerProtocol, ServerWelcome},
    routing::HandlerRegistry,
    session::{CloseReason, Credentials, Phase},
};

type ServerConn = Framed<TcpStream, PacketCodec>;

async fn listen() -> (TcpListener, std::net::SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");
    (listener, addr)
}

async fn accept(listener: &TcpListener) -> ServerConn {
    let (stream, _) = listener.accept().await.expect("accept client");
    Framed::new(stream, PacketCodec::default())
}

async fn next_packet(conn: &mut ServerConn) -> Packet {
    conn.next()
        .await
        .expect("client sent a packet")
        .expect("packet decodes")
}

async fn greet(conn: &mut ServerConn) {
    conn.send(Packet::from(ServerProtocol::default()))
        .await
        .expect("send protocol");
    conn.send(Packet::from(ServerWelcome {
        server_name: "Test Server".into(),
        ..ServerWelcome::default()
    }))
    .await
    .expect("send welcome");
}

fn spawn_run(client: AdminClient) -> JoinHandle<Result<CloseReason, ClientError>> {
    tokio::spawn(client.run())
}

#[test]
fn run_future_is_send() {
    fn assert_send<T: Send>(_: &T) {}
    fn check(client: AdminClient) { assert_send(&client.run()); }
    let _: fn(AdminClient) = check;
}

#[tokio::test]
async fn authenticates_routes_and_disconnects_on_request() {
    let (listener, addr) = listen().await;
    let dates = Arc::new(Mutex::new(Vec::new()));
    let sink = dates.clone();
    let handlers = HandlerRegistry::new()
        .on::<ServerDate, _>(move |ctx, date| {
            sink.lock().expect("dates lock").push((ctx.phase(), date.date));
            ctx.disconnect();
            Ok(())
        })
        .expect("register");

    let client = AdminClient::builder()
        .credentials(Credentials::new().password("secret").name("testbot"))
        .handlers(handlers)
        .connect(addr)
        .await
        .expect("connect");
    let mut server = accept(&listener).await;
    let run = spawn_run(client);

    let Packet::AdminJoin(join) = next_packet(&mut server).await else {
        panic!("expected join request first");
    };
    assert_eq!(join.password, "secret");
    assert_eq!(join.name, "testbot");

    greet(&mut server).await;
    server
        .send(Packet::from(ServerDate { date: 740_000 }))
        .await
        .expect("send date");

    assert!(matches!(next_packet(&mut server).await, Packet::AdminQuit(_)));
    assert!(server.next().await.is_none(), "client shuts down its write half");
    drop(server);

    let reason = run.await.expect("join").expect("run");
    assert!(matches!(reason, CloseReason::Requested));
    assert_eq!(
        *dates.lock().expect("dates lock"),
        vec![(Phase::Authenticated, 740_000)]
    );
}

#[tokio::test]
async fn server_hangup_is_reported_as_lost() {
    let (listener, addr) = listen().await;
    let client = AdminClient::builder().connect(addr).await.expect("connect");
    assert_eq!(client.phase(), Phase::Connected);
    let server = accept(&listener).await;

    drop(server);

    let reason = client.run().await.expect("run");
    assert!(matches!(reason, CloseReason::Lost(_)));
}

#[tokio::test]
async fn malformed_stream_closes_with_codec_reason() {
    let (listener, addr) = listen().await;
    let client = AdminClient::builder().connect(addr).await.expect("connect");
    let server = accept(&listener).await;
    let run = spawn_run(client);

    let mut stream = server.into_inner();
    tokio::io::AsyncWriteExt::write_all(&mut stream, &[1, 0, 104])
        .await
        .expect("write garbage");

    let reason = run.await.expect("join").expect("run");
    assert!(matches!(reason, CloseReason::Codec(_)));
}

#[tokio::test]
async fn handle_sends_and_disconnects() {
    let (listener, addr) = listen().await;
    let client = AdminClient::builder()
        .close_timeout(Duration::from_secs(5))
        .connect(addr)
        .await
        .expect("connect");
    let handle = client.handle();
    let mut server = accept(&listener).await;
    let run = spawn_run(client);

    handle
        .send(AdminChat::broadcast("hello players"))
        .expect("queue chat");
    let Packet::AdminChat(chat) = next_packet(&mut server).await else {
        panic!("expected chat");
    };
    assert_eq!(chat.message, "hello players");

    handle.disconnect().expect("queue disconnect");
    assert!(matches!(next_packet(&mut server).await, Packet::AdminQuit(_)));
    drop(server);

    let reason = run.await.expect("join").expect("run");
    assert!(matches!(reason, CloseReason::Requested));
    assert!(handle.is_stopped());
    assert!(matches!(
        handle.send(AdminChat::broadcast("too late")),
        Err(ClientError::Stopped)
    ));
}

#[tokio::test]
async fn unresponsive_server_is_closed_after_timeout() {
    let (listener, addr) = listen().await;
    let client = AdminClient::builder()
        .close_timeout(Duration::from_millis(50))
        .connect(addr)
        .await
        .expect("connect");
    let handle = client.handle();
    let _server = accept(&listener).await;
    let run = spawn_run(client);

    handle.disconnect().expect("queue disconnect");

    let reason = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run finishes after close timeout")
        .expect("join")
        .expect("run");
    assert!(matches!(reason, CloseReason::Requested));
}

#[tokio::test]
async fn handler_errors_are_reported_and_routing_continues() {
    let (listener, addr) = listen().await;
    let errors = Arc::new(Mutex::new(Vec::new()));
    let error_sink = errors.clone();
    let dates = Arc::new(Mutex::new(Vec::new()));
    let date_sink = dates.clone();
    let handlers = HandlerRegistry::new()
        .on::<ServerDate, _>(move |ctx, date| {
            date_sink.lock().expect("dates lock").push(date.date);
            match date.date {
                1 => Err("bad date".into()),
                _ => {
                    ctx.disconnect();
                    Ok(())
                }
            }
        })
        .expect("register");
    let client = AdminClient::builder()
        .handlers(handlers)
        .on_error(move |err| {
            let message = err.to_string();
            let sink = error_sink.clone();
            async move { sink.lock().expect("errors lock").push(message) }
        })
        .connect(addr)
        .await
        .expect("connect");
    let mut server = accept(&listener).await;
    let run = spawn_run(client);

    server
        .feed(Packet::from(ServerDate { date: 1 }))
        .await
        .expect("queue first date");
    server
        .send(Packet::from(ServerDate { date: 2 }))
        .await
        .expect("send second date");
    assert!(matches!(next_packet(&mut server).await, Packet::AdminQuit(_)));
    drop(server);

    let reason = run.await.expect("join").expect("run");
    assert!(matches!(reason, CloseReason::Requested));
    assert_eq!(*dates.lock().expect("dates lock"), vec![1, 2]);
    let errors = errors.lock().expect("errors lock");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("bad date"));
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn builder_applies_nodelay_option(#[case] enabled: bool) {
    let (listener, addr) = listen().await;
    let client = AdminClient::builder()
        .nodelay(enabled)
        .connect(addr)
        .await
        .expect("connect");
    let _server = accept(&listener).await;

    let nodelay = client.reader.as_ref().nodelay().expect("read nodelay");
    assert_eq!(nodelay, enabled);
}

#[tokio::test]
async fn builder_applies_linger_option() {
    let (listener, addr) = listen().await;
    let linger = Some(Duration::from_secs(3));
    let client = AdminClient::builder()
        .socket_options(SocketOptions::default().linger(linger))
        .connect(addr)
        .await
        .expect("connect");
    let _server = accept(&listener).await;

    let applied = socket2::SockRef::from(client.reader.as_ref())
        .linger()
        .expect("read linger");
    assert_eq!(applied, linger);
}

#[tokio::test]
async fn connect_host_resolves_names() {
    let (listener, addr) = listen().await;
    let client = AdminClient::builder()
        .connect_host("localhost", addr.port())
        .await;
    let Ok(client) = client else {
        // Hosts without an IPv4 loopback entry for localhost cannot reach
        // the listener.
        return;
    };
    let _server = accept(&listener).await;
    assert_eq!(client.session().peer_addr().map(|a| a.port()), Some(addr.port()));
}
