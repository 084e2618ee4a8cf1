//! Peer-to-peer bus fixtures for interface tests.

use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::net::UnixStream;
use zbus::{Connection, Guid, Message, MessageStream, connection::Builder, message::Type};

use super::{MPRIS_OBJECT_PATH, PlayerInterface, PropertyTable, RootInterface};
use crate::services::bluez::testing::{FakeDevice, FakePlayer};

pub fn table(player: Arc<FakePlayer>) -> Arc<PropertyTable> {
    Arc::new(PropertyTable::new(
        Arc::new(FakeDevice::new("Headphones")),
        player,
        "btdevAAplayer0",
        "file:///art.png",
    ))
}

/// Connected pair; the first connection serves both interfaces from `table`.
pub async fn served_pair(table: Arc<PropertyTable>) -> (Connection, Connection) {
    let (server, client) = UnixStream::pair().unwrap();

    let server = Builder::unix_stream(server)
        .server(Guid::generate())
        .unwrap()
        .p2p()
        .serve_at(MPRIS_OBJECT_PATH, RootInterface::new(Arc::clone(&table)))
        .unwrap()
        .serve_at(MPRIS_OBJECT_PATH, PlayerInterface::new(table))
        .unwrap()
        .build();
    let client = Builder::unix_stream(client).p2p().build();

    futures::try_join!(server, client).unwrap()
}

/// Next signal on `stream`, skipping method replies.
pub async fn next_signal(stream: &mut MessageStream) -> Message {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let message = stream.next().await.unwrap().unwrap();
            if message.message_type() == Type::Signal {
                return message;
            }
        }
    })
    .await
    .unwrap()
}
