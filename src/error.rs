//! Error taxonomy for the Leader replication core (§7 of the design spec).
//!
//! Only one class of failure is ever surfaced out of the Leader as an `Error`:
//! a persistent-log read failure encountered while assembling a replication
//! request. Every other failure mode described in §7 (transient peer errors,
//! snapshot streaming failures, rejections, higher-term observations) is
//! absorbed internally and converted into progress-table state instead.

error_chain::error_chain! {
    foreign_links {
        Io(::std::io::Error);
    }

    errors {
        /// The persistent log collaborator failed to answer a read needed to
        /// build a replication request or resolve snapshot metadata. This is
        /// fatal to the current Leader instance (§7): it propagates up so the
        /// enclosing engine can trigger a role transition.
        Log(msg: String) {
            description("persistent log read failed")
            display("persistent log read failed: {}", msg)
        }

        /// The state machine collaborator failed to produce a snapshot
        /// writer or to apply a contiguous range of committed entries.
        StateMachine(msg: String) {
            description("state machine operation failed")
            display("state machine operation failed: {}", msg)
        }

        /// The transport failed to stream a snapshot body to a peer. This is
        /// never fatal: the snapshot-in-flight slot is cleared and the next
        /// heartbeat round re-probes the peer.
        Transport(msg: String) {
            description("transport operation failed")
            display("transport operation failed: {}", msg)
        }

        /// A configuration document could not be parsed.
        Config(msg: String) {
            description("invalid configuration")
            display("invalid configuration: {}", msg)
        }
    }
}
