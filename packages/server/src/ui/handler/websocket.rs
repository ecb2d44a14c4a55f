//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{Connection, Role},
    infrastructure::dto::websocket::{MessageType, RoomConnectedMessage},
    ui::state::{AppState, ConnectQuery},
    usecase::{
        ConnectError, ConnectParticipantUseCase, DisconnectParticipantUseCase, SendMessageUseCase,
    },
};

/// `/ws/patient`: the caller is the patient of the room.
pub async fn patient_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    websocket_handler(ws, state, query, Role::Patient).await
}

/// `/ws/staff`: the caller is the staff member assigned to the patient.
pub async fn staff_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    websocket_handler(ws, state, query, Role::Staff).await
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    state: Arc<AppState>,
    query: ConnectQuery,
    role: Role,
) -> Result<impl IntoResponse, StatusCode> {
    let connect_usecase =
        ConnectParticipantUseCase::new(state.directory.clone(), state.registry.clone());

    // Resolve before upgrading so that rejected connections never reach the registry
    let connection = match connect_usecase.resolve(&query.patient_id, role).await {
        Ok(connection) => connection,
        Err(ConnectError::InvalidIdentity(e)) => {
            tracing::warn!("Invalid patient_id '{}': {}", query.patient_id, e);
            return Err(StatusCode::BAD_REQUEST);
        }
        Err(ConnectError::PatientNotFound(_)) => return Err(StatusCode::NOT_FOUND),
        Err(ConnectError::Lifecycle(e)) => {
            tracing::error!("Unexpected lifecycle error: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, mut connection: Connection) {
    let (mut sender, mut receiver) = socket.split();

    // Bounded outbound queue for this connection
    let (tx, mut rx) = mpsc::channel::<String>(state.outbound_buffer);

    let connect_usecase =
        ConnectParticipantUseCase::new(state.directory.clone(), state.registry.clone());
    let opened = match connect_usecase.execute(&mut connection, tx.clone()).await {
        Ok(opened) => opened,
        Err(e) => {
            tracing::error!(connection_id = %connection.id, "Failed to open connection: {}", e);
            return;
        }
    };

    let disconnect_usecase = DisconnectParticipantUseCase::new(state.registry.clone());

    let room_msg = RoomConnectedMessage {
        r#type: MessageType::RoomConnected,
        room_key: connection.room_key().as_str().to_string(),
        role: connection.role,
        peer_online: opened.peer_online,
    };
    let delivered = match serde_json::to_string(&room_msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize room-connected: {}", e);
            false
        }
    };
    if !delivered {
        tracing::warn!(connection_id = %connection.id, "Failed to send room-connected");
        disconnect_usecase.execute(&mut connection).await;
        return;
    }

    // The registry may drop its handle when this connection is replaced;
    // holding our own sender keeps the socket open until the client leaves.
    let _own_outbound = tx;

    let router = SendMessageUseCase::new(
        state.registry.clone(),
        state.dispatcher.clone(),
        state.relay_timeout,
    );
    let reader = connection.clone();

    // Spawn a task to receive frames from this client and route them
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(connection_id = %reader.id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if let Err(e) = router.execute(&reader, text.as_str()).await {
                        tracing::warn!(
                            connection_id = %reader.id,
                            room_key = %reader.room_key(),
                            "Dropped inbound frame: {}",
                            e
                        );
                    }
                }
                Message::Binary(_) => {
                    tracing::warn!(connection_id = %reader.id, "Ignoring binary frame");
                }
                Message::Close(_) => {
                    tracing::debug!(connection_id = %reader.id, "Client requested close");
                    break;
                }
                // Ping/pong is handled by the WebSocket protocol
                _ => {}
            }
        }
    });

    // Spawn a task to drain the outbound queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    disconnect_usecase.execute(&mut connection).await;
}
