//! Snapshot assembly
//!
//! A custom animation replaces everything the device shows, so updating one
//! panel means re-sending every panel. The snapshot is assembled from the
//! state store, which is the single source of truth for what each panel
//! should look like.

use crate::command::{Frame, Transition};
use crate::panel::PanelId;
use crate::state::{SessionId, StateKey, StateStore};

/// Frame listing every panel in `panel_ids` at its commanded, visible colour.
///
/// Write the changed panel's state to the store before calling this; the
/// snapshot then carries the new colour for it and the preserved colours
/// for everything else.
pub fn assemble_snapshot(
    store: &StateStore,
    session: &SessionId,
    panel_ids: &[PanelId],
    transition: Transition,
) -> Frame {
    let mut frame = Frame::with_capacity(panel_ids.len());
    for &id in panel_ids {
        let color = store.get(&StateKey::panel(session, id)).visible_color();
        frame.set(id, color, transition);
    }
    frame
}
