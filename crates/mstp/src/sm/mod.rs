//! The nine cooperating 802.1Q state machines.
//!
//! Each module holds the machine's `State` enum and a unit struct
//! implementing [`crate::scheduler::StateMachine`].

pub(crate) mod bridge_detection;
pub(crate) mod port_information;
pub(crate) mod port_protocol_migration;
pub(crate) mod port_receive;
pub(crate) mod port_role_selection;
pub(crate) mod port_role_transitions;
pub(crate) mod port_state_transition;
pub(crate) mod port_transmit;
pub(crate) mod topology_change;

pub(crate) use bridge_detection::BridgeDetection;
pub(crate) use port_information::PortInformation;
pub(crate) use port_protocol_migration::PortProtocolMigration;
pub(crate) use port_receive::PortReceive;
pub(crate) use port_role_selection::PortRoleSelection;
pub(crate) use port_role_transitions::PortRoleTransitions;
pub(crate) use port_state_transition::PortStateTransition;
pub(crate) use port_transmit::PortTransmit;
pub(crate) use topology_change::TopologyChange;
