//! Shared test collaborators: scriptable engine, recording transport
//! group, and a small harness wiring them to a proxy.

use std::sync::Arc;

use collab_server::{
    Connection, ConnectionId, ConnectionRef, DeliveryScope, GroupRef, SessionEngine, SessionProxy,
    SessionStatus, SubscriptionGroup, SyncStatus, User, UserProps, UserRef, UserTable,
};
use collab_types::{Error, ErrorCode};
use collab_xml::XmlFrame;
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;

pub struct TestConnection {
    id: u64,
    name: String,
}

impl Connection for TestConnection {
    fn id(&self) -> ConnectionId {
        ConnectionId(self.id)
    }

    fn remote_id(&self) -> &str {
        &self.name
    }
}

pub fn connection(id: u64, name: &str) -> ConnectionRef {
    Arc::new(TestConnection {
        id,
        name: name.to_owned(),
    })
}

/// Transport group that records membership changes and point-to-point
/// traffic. Broadcast traffic goes through the engine, not the group.
#[derive(Default)]
pub struct MockGroup {
    pub members: Mutex<Vec<ConnectionId>>,
    pub removed: Mutex<Vec<ConnectionId>>,
    pub sent: Mutex<Vec<(ConnectionId, XmlFrame)>>,
}

impl MockGroup {
    #[allow(unused)]
    pub fn sent_to(&self, connection: &ConnectionRef) -> Vec<XmlFrame> {
        self.sent
            .lock()
            .iter()
            .filter(|(id, _)| *id == connection.id())
            .map(|(_, f)| f.clone())
            .collect()
    }
}

impl SubscriptionGroup for MockGroup {
    fn name(&self) -> &str {
        "test-session"
    }

    fn add_member(&self, connection: &ConnectionRef) {
        self.members.lock().push(connection.id());
    }

    fn remove_member(&self, connection: &ConnectionRef) {
        self.members.lock().retain(|id| *id != connection.id());
        self.removed.lock().push(connection.id());
    }

    fn send_message(&self, connection: &ConnectionRef, frame: &XmlFrame) {
        self.sent.lock().push((connection.id(), frame.clone()));
    }
}

/// Session engine with scriptable status, synchronization table and
/// validation outcome, recording broadcasts and forwarded frames.
pub struct MockEngine {
    pub status: RwLock<SessionStatus>,
    pub table: UserTable,
    pub syncs: Mutex<HashMap<u64, SyncStatus>>,
    pub broadcasts: Mutex<Vec<XmlFrame>>,
    pub forwarded: Mutex<Vec<(ConnectionId, XmlFrame)>>,
    pub cancelled: Mutex<Vec<ConnectionId>>,
    pub sync_targets: Mutex<Vec<ConnectionId>>,
    pub group: Mutex<Option<GroupRef>>,
    pub validate_error: Mutex<Option<ErrorCode>>,
}

impl MockEngine {
    pub fn new(status: SessionStatus) -> Self {
        Self {
            status: RwLock::new(status),
            table: UserTable::new(),
            syncs: Mutex::new(HashMap::new()),
            broadcasts: Mutex::new(Vec::new()),
            forwarded: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            sync_targets: Mutex::new(Vec::new()),
            group: Mutex::new(None),
            validate_error: Mutex::new(None),
        }
    }

    #[allow(unused)]
    pub fn set_sync(&self, connection: &ConnectionRef, status: SyncStatus) {
        if status == SyncStatus::None {
            self.syncs.lock().remove(&connection.id().0);
        } else {
            self.syncs.lock().insert(connection.id().0, status);
        }
    }
}

impl SessionEngine for MockEngine {
    fn status(&self) -> SessionStatus {
        *self.status.read()
    }

    fn close(&self) {
        *self.status.write() = SessionStatus::Closed;
    }

    fn user_table(&self) -> &UserTable {
        &self.table
    }

    fn set_subscription_group(&self, group: Option<GroupRef>) {
        *self.group.lock() = group;
    }

    fn send_to_subscriptions(&self, frame: &XmlFrame) {
        self.broadcasts.lock().push(frame.clone());
    }

    fn validate_user_props(&self, _props: &UserProps, _exclude: Option<&UserRef>)
        -> Result<(), Error> {
        match *self.validate_error.lock() {
            Some(code) => Err(Error::new(code, "scripted validation failure")),
            None => Ok(()),
        }
    }

    fn read_user_props(
        &self,
        frame: &XmlFrame,
        _connection: Option<&ConnectionRef>,
    ) -> Result<UserProps, Error> {
        UserProps::from_xml_frame(frame)
    }

    fn write_user_props(&self, user: &UserRef, frame: &mut XmlFrame) {
        user.write_xml_attrs(frame);
    }

    fn add_user(&self, props: &UserProps) -> Result<UserRef, Error> {
        Ok(self.table.insert(User::from_props(props)?))
    }

    fn has_synchronizations(&self) -> bool {
        self.syncs
            .lock()
            .values()
            .any(|status| *status != SyncStatus::None)
    }

    fn synchronization_status(&self, connection: &ConnectionRef) -> SyncStatus {
        self.syncs
            .lock()
            .get(&connection.id().0)
            .copied()
            .unwrap_or(SyncStatus::None)
    }

    fn cancel_synchronization(&self, connection: &ConnectionRef) {
        self.cancelled.lock().push(connection.id());
        self.syncs.lock().remove(&connection.id().0);
    }

    fn synchronize_to(&self, _group: &GroupRef, connection: &ConnectionRef) {
        self.sync_targets.lock().push(connection.id());
        self.syncs
            .lock()
            .insert(connection.id().0, SyncStatus::InProgress);
    }

    fn receive_frame(
        &self,
        connection: &ConnectionRef,
        frame: &XmlFrame,
    ) -> Result<DeliveryScope, Error> {
        self.forwarded.lock().push((connection.id(), frame.clone()));
        Ok(DeliveryScope::Group)
    }
}

/// A proxy wired to a mock engine and a mock group.
pub struct Tester {
    pub engine: Arc<MockEngine>,
    pub group: Arc<MockGroup>,
    pub notify: Arc<Notify>,
    pub proxy: SessionProxy,
}

impl Tester {
    pub fn new() -> Self {
        Self::with_status(SessionStatus::Running)
    }

    #[allow(unused)]
    pub fn synchronizing() -> Self {
        Self::with_status(SessionStatus::Synchronizing)
    }

    fn with_status(status: SessionStatus) -> Self {
        let engine = Arc::new(MockEngine::new(status));
        let group = Arc::new(MockGroup::default());
        let notify = Arc::new(Notify::new());
        let proxy = SessionProxy::new(notify.clone(), engine.clone(), group.clone());
        Self {
            engine,
            group,
            notify,
            proxy,
        }
    }

    /// Subscribe a fresh connection without state push.
    pub fn subscribe(&mut self, id: u64, name: &str, seq_id: u32) -> ConnectionRef {
        let conn = connection(id, name);
        self.proxy
            .subscribe_to(conn.clone(), seq_id, false)
            .expect("subscribe failed");
        conn
    }

    /// Feed an inbound frame from `connection` into the proxy.
    pub fn receive(
        &mut self,
        connection: &ConnectionRef,
        xml: &str,
    ) -> Result<DeliveryScope, Error> {
        let frame = XmlFrame::parse(xml).expect("bad test frame");
        self.proxy.receive_message(connection, &frame)
    }

    /// Record idle transitions into a shared log.
    #[allow(unused)]
    pub fn record_idle(&mut self) -> Arc<Mutex<Vec<bool>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        self.proxy.connect_idle_changed(move |idle| {
            sink.lock().push(*idle);
        });
        log
    }

    /// Simulate the transport confirming that a connection left the
    /// group: drop membership, then deliver member-removed to the proxy.
    #[allow(unused)]
    pub fn drop_member(&mut self, connection: &ConnectionRef) {
        self.group.remove_member(connection);
        self.proxy.member_removed(connection);
    }
}
