use crate::config::ClientConfig;
use crate::negotiation::{ConnectorFactory, PeerConnector};
use crate::transport::TransportEvent;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, PeerName, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

pub const DATA_CHANNEL_LABEL: &str = "huddle";

/// `PeerConnector` over a real `RTCPeerConnection`.
pub struct WebRtcConnector {
    remote: PeerName,
    peer_connection: Arc<RTCPeerConnection>,
    data_channel: Mutex<Option<Arc<RTCDataChannel>>>,
}

impl WebRtcConnector {
    /// Builds the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        remote: PeerName,
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        let state_remote = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let remote = state_remote.clone();

                Box::pin(async move {
                    info!(remote = %remote, state = %s, "Peer connection state changed");
                    let event = match s {
                        RTCPeerConnectionState::Connected => TransportEvent::Connected(remote),
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => TransportEvent::Disconnected(remote),
                        _ => return,
                    };
                    let _ = tx.send(event).await;
                })
            },
        ));

        // trickle ICE; `None` means gathering finished
        let ice_tx = event_tx.clone();
        let ice_remote = remote.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let remote = ice_remote.clone();

            Box::pin(async move {
                let candidate = match c {
                    Some(candidate) => match candidate.to_json() {
                        Ok(init) => Some(from_rtc_candidate(init)),
                        Err(e) => {
                            warn!(remote = %remote, error = %e, "Unserializable local candidate");
                            return;
                        }
                    },
                    None => None,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(remote, candidate))
                    .await;
            })
        }));

        let dc_remote = remote.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let remote = dc_remote.clone();
            Box::pin(async move {
                debug!(remote = %remote, label = dc.label(), "Remote data channel announced");
            })
        }));

        Ok(Self {
            remote,
            peer_connection,
            data_channel: Mutex::new(None),
        })
    }

    pub fn remote(&self) -> &PeerName {
        &self.remote
    }

    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }
}

#[async_trait]
impl PeerConnector for WebRtcConnector {
    async fn create_offer(&self) -> Result<SessionDescription> {
        // an offer with no channel or track has nothing to negotiate
        let mut channel = self.data_channel.lock().await;
        if channel.is_none() {
            let dc = self
                .peer_connection
                .create_data_channel(DATA_CHANNEL_LABEL, None)
                .await
                .context("Failed to create data channel")?;
            *channel = Some(dc);
        }
        drop(channel);

        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await
            .context("Failed to add remote ICE candidate")?;
        Ok(())
    }

    async fn end_of_candidates(&self) -> Result<()> {
        // an empty candidate string is the end-of-candidates marker
        self.peer_connection
            .add_ice_candidate(RTCIceCandidateInit::default())
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates a `WebRtcConnector` per remote peer, all reporting into one channel.
#[derive(Clone)]
pub struct WebRtcConnectorFactory {
    ice_servers: Vec<IceServerConfig>,
    event_tx: mpsc::Sender<TransportEvent>,
}

impl WebRtcConnectorFactory {
    pub fn new(config: &ClientConfig, event_tx: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            ice_servers: config.ice_servers.clone(),
            event_tx,
        }
    }
}

#[async_trait]
impl ConnectorFactory for WebRtcConnectorFactory {
    type Connector = WebRtcConnector;

    async fn create(&self, remote: &PeerName) -> Result<WebRtcConnector> {
        WebRtcConnector::new(remote.clone(), &self.ice_servers, self.event_tx.clone()).await
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        SdpKind::Pranswer => RTCSessionDescription::pranswer(desc.sdp)?,
        SdpKind::Rollback => bail!("rollback descriptions are not supported"),
    };
    Ok(desc)
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}
