//! The one-second timer tick: every running timer counts down by one.

use crate::state::BridgeState;

fn dec(timer: &mut u16) {
    *timer = timer.saturating_sub(1);
}

pub(crate) fn tick(bridge: &mut BridgeState) {
    for port in &mut bridge.ports {
        dec(&mut port.hello_when);
        dec(&mut port.mdelay_while);
        dec(&mut port.edge_delay_while);
        port.tx_count = port.tx_count.saturating_sub(1);

        for pt in &mut port.trees {
            dec(&mut pt.fd_while);
            dec(&mut pt.rr_while);
            dec(&mut pt.rb_while);
            dec(&mut pt.tc_while);
            dec(&mut pt.rcvd_info_while);
        }
    }

    for (index, tree) in bridge.trees.iter_mut().enumerate() {
        tree.topology_change_active = bridge.ports.iter().any(|p| p.trees[index].tc_while != 0);
    }
}
