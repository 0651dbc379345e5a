//! Text rendering of a tracker snapshot.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use fleet_tracker::{Entity, Snapshot};

use crate::config::MapSize;

const EMPTY: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Marker {
    Other,
    Own,
    Selected,
}

impl Marker {
    fn of(entity: &Entity, selected: Option<&str>) -> Self {
        if selected == Some(entity.id.as_str()) {
            Self::Selected
        } else if entity.is_self {
            Self::Own
        } else {
            Self::Other
        }
    }

    const fn glyph(self) -> char {
        match self {
            Self::Other => '*',
            Self::Own => '@',
            Self::Selected => '#',
        }
    }
}

/// Render the map grid, status line, fleet list and detail panel.
pub fn frame(snapshot: &Snapshot, map: MapSize, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    grid(&mut out, snapshot, map);
    status(&mut out, snapshot, now);
    fleet(&mut out, snapshot);
    detail(&mut out, snapshot);
    out
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn cell(value: f64, cells: usize) -> usize {
    (value * (cells - 1) as f64).round() as usize
}

fn grid(out: &mut String, snapshot: &Snapshot, map: MapSize) {
    let selected = snapshot.view.selected_id.as_deref();
    let mut cells: Vec<Vec<Option<Marker>>> = vec![vec![None; map.width]; map.height];

    for entity in &snapshot.entities {
        let point = snapshot.project(entity.position);
        if !point.is_visible() {
            continue;
        }
        let slot = &mut cells[cell(point.y, map.height)][cell(point.x, map.width)];
        let marker = Marker::of(entity, selected);
        if slot.is_none_or(|current| marker > current) {
            *slot = Some(marker);
        }
    }

    let border = format!("+{}+\n", "-".repeat(map.width));
    out.push_str(&border);
    for row in cells {
        out.push('|');
        out.extend(row.into_iter().map(|c| c.map_or(EMPTY, Marker::glyph)));
        out.push_str("|\n");
    }
    out.push_str(&border);
}

fn status(out: &mut String, snapshot: &Snapshot, now: DateTime<Utc>) {
    let transmit = if snapshot.view.transmitting { "on" } else { "off" };
    let refreshed = snapshot.refreshed_at.map_or_else(
        || "never".to_string(),
        |at| format!("{}s ago", (now - at).num_seconds().max(0)),
    );
    let _ = writeln!(
        out,
        "device {}  transmit {transmit}  status {}  refreshed {refreshed}",
        snapshot.device_id, snapshot.view.status
    );
}

fn fleet(out: &mut String, snapshot: &Snapshot) {
    if snapshot.entities.is_empty() {
        out.push_str("no vehicles reported\n");
        return;
    }

    let selected = snapshot.view.selected_id.as_deref();
    for entity in &snapshot.entities {
        let _ = writeln!(
            out,
            " {} {:<18} {:<16} {:<8} {:>4.0} km/h {:>3}%",
            Marker::of(entity, selected).glyph(),
            entity.id,
            entity.name,
            entity.status,
            entity.speed_kmh,
            entity.battery_pct
        );
    }
}

fn detail(out: &mut String, snapshot: &Snapshot) {
    let Some(id) = snapshot.view.selected_id.as_deref() else {
        return;
    };
    let Some(entity) = snapshot.selected() else {
        let _ = writeln!(out, "\n{id}: no longer reported");
        return;
    };

    let _ = writeln!(out, "\n{} ({})", entity.name, entity.id);
    let _ = writeln!(
        out,
        "  position {:.4}, {:.4}",
        entity.position.latitude, entity.position.longitude
    );
    let _ = writeln!(out, "  speed    {:.0} km/h", entity.speed_kmh);
    let _ = writeln!(out, "  battery  {}%", entity.battery_pct);
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use fleet_tracker::{Bounds, DeviceId, Kind, Position, Status, ViewState};

    use super::*;

    fn entity(id: &str, latitude: f64, longitude: f64) -> Entity {
        Entity {
            id: id.to_string(),
            name: format!("Unit {id}"),
            kind: Kind::Mobile,
            position: Position::new(latitude, longitude),
            status: Status::Active,
            speed_kmh: 12.0,
            battery_pct: 80,
            is_self: id == "mobile-self",
        }
    }

    fn snapshot(entities: Vec<Entity>, selected: Option<&str>) -> Snapshot {
        let bounds = Bounds::fit(entities.iter().map(|e| e.position), 0.005);
        Snapshot {
            entities,
            bounds,
            view: ViewState { selected_id: selected.map(str::to_string), ..ViewState::default() },
            device_id: DeviceId::from("mobile-self"),
            refreshed_at: None,
        }
    }

    fn rows(frame: &str, height: usize) -> Vec<&str> {
        frame.lines().skip(1).take(height).collect()
    }

    #[test]
    fn markers_land_on_projected_cells() {
        let map = MapSize { width: 5, height: 5 };
        let snapshot = snapshot(
            vec![entity("a", 10.0, 20.0), entity("mobile-self", 10.01, 20.01)],
            None,
        );
        let frame = frame(&snapshot, map, Utc::now());

        // a projects to (0.25, 0.75), self to (0.75, 0.25)
        assert_eq!(rows(&frame, 5), ["|.....|", "|...@.|", "|.....|", "|.*...|", "|.....|"]);
    }

    #[test]
    fn selection_outranks_self() {
        let map = MapSize { width: 3, height: 3 };
        let snapshot = snapshot(
            vec![entity("mobile-self", 1.0, 1.0), entity("v1", 1.0, 1.0)],
            Some("v1"),
        );
        let frame = frame(&snapshot, map, Utc::now());

        assert_eq!(rows(&frame, 3), ["|...|", "|.#.|", "|...|"]);
        assert!(frame.contains("Unit v1 (v1)"));
        assert!(frame.contains("position 1.0000, 1.0000"));
        assert!(frame.contains("speed    12 km/h"));
    }

    #[test]
    fn dangling_selection() {
        let snapshot = snapshot(vec![entity("v2", 1.0, 1.0)], Some("v1"));
        let frame = frame(&snapshot, MapSize::default(), Utc::now());
        assert!(frame.contains("v1: no longer reported"));
    }

    #[test]
    fn data_age() {
        let now = Utc::now();
        let mut snapshot = snapshot(vec![], None);
        assert!(frame(&snapshot, MapSize::default(), now).contains("refreshed never"));
        assert!(frame(&snapshot, MapSize::default(), now).contains("no vehicles reported"));

        snapshot.refreshed_at = Some(now - TimeDelta::seconds(7));
        let frame = frame(&snapshot, MapSize::default(), now);
        assert!(frame.contains("refreshed 7s ago"));
        assert!(frame.contains("transmit off  status Idle"));
    }
}
