use lineflow_core::{
    assemble_snapshot, build_groups, resolve_panels, CommandedState, LayoutDocument, ManualGroups,
    Rgb, SessionId, StateKey, StatePatch, StateStore, Transition,
};
use serde_json::json;

/// Nine segments on a circle at 10, 50, ... 330 degrees, listed in a
/// scrambled layout order, plus connectors and the controller.
fn ring_layout() -> LayoutDocument {
    let order = [5usize, 0, 8, 3, 1, 7, 2, 6, 4];
    let mut position_data = Vec::new();
    for &k in &order {
        let angle = (10.0 + 40.0 * k as f64).to_radians();
        position_data.push(json!({
            "panelId": 100 + k,
            "x": 1000.0 * angle.cos(),
            "y": 1000.0 * angle.sin(),
            "o": 0,
            "shapeType": 18
        }));
        position_data.push(json!({ "panelId": 200 + k, "x": 0, "y": 0, "o": 0, "shapeType": 16 }));
    }
    position_data.push(json!({ "panelId": 1, "x": 0, "y": 0, "o": 0, "shapeType": 19 }));

    serde_json::from_value(json!({
        "numPanels": position_data.len(),
        "sideLength": 0,
        "positionData": position_data
    }))
    .unwrap()
}

#[test]
fn test_ring_of_nine_groups_by_angle() {
    let panels = resolve_panels(&ring_layout());
    assert_eq!(panels.len(), 9);

    let groups = build_groups(&panels, None, 3);
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].panel_ids, vec![100, 101, 102]);
    assert_eq!(groups[1].panel_ids, vec![103, 104, 105]);
    assert_eq!(groups[2].panel_ids, vec![106, 107, 108]);

    let angles: Vec<f64> = {
        let mut a: Vec<f64> = panels.iter().map(|p| p.angle).collect();
        a.sort_by(f64::total_cmp);
        a
    };
    assert_eq!(
        angles,
        vec![10.0, 50.0, 90.0, 130.0, 170.0, 210.0, 250.0, 290.0, 330.0]
    );
}

#[test]
fn test_manual_groups_index_layout_order() {
    let panels = resolve_panels(&ring_layout());
    let manual: ManualGroups = "0,1,2; 3,4,5".parse().unwrap();

    let groups = build_groups(&panels, Some(&manual), 3);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].panel_ids, vec![105, 100, 108]);
    assert_eq!(groups[1].panel_ids, vec![103, 101, 107]);
}

#[test]
fn test_single_panel_update_preserves_the_other_eight() {
    let session = SessionId::new("fixture");
    let store = StateStore::new();
    let ids: Vec<u16> = (1..=9).collect();

    for &id in &ids {
        store.set(
            StateKey::panel(&session, id),
            &StatePatch::on()
                .with_color(Some(Rgb::new(id as u8 * 20, 100, 200)))
                .with_brightness(Some(128)),
        );
    }

    store.set(
        StateKey::panel(&session, 7),
        &StatePatch::on()
            .with_color(Some(Rgb::new(255, 0, 0)))
            .with_brightness(Some(255)),
    );

    let frame = assemble_snapshot(&store, &session, &ids, Transition(10));
    assert_eq!(frame.len(), 9);
    for &id in &ids {
        let expected = if id == 7 {
            Rgb::new(255, 0, 0)
        } else {
            CommandedState {
                is_on: true,
                brightness: 128,
                rgb_color: Rgb::new(id as u8 * 20, 100, 200),
            }
            .visible_color()
        };
        assert_eq!(frame.get(id).unwrap().color, expected, "panel {}", id);
    }

    let anim = frame.to_anim_data();
    assert!(anim.starts_with("9 1 1 10 50 100 0 10 "));
    assert!(anim.contains(" 7 1 255 0 0 0 10 "));
}
