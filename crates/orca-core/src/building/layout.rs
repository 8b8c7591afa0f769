//! Built-in building layouts.

use std::collections::{BTreeSet, HashMap};

use super::{FuelLevel, Room};
use crate::error::RequestError;

pub const DEMO_FLOOR: &str = "demo_floor";
pub const SIEBEL_CENTER: &str = "siebel_center";

/// Names accepted by [`by_name`].
pub const LAYOUT_NAMES: [&str; 2] = [DEMO_FLOOR, SIEBEL_CENTER];

const SIEBEL_FLOORS: u32 = 4;

/// Resolve a layout by name.
pub fn by_name(name: &str) -> Result<Vec<Room>, RequestError> {
    match name {
        DEMO_FLOOR => Ok(demo_floor()),
        SIEBEL_CENTER => Ok(siebel_center()),
        other => Err(RequestError::UnknownLayout(other.to_string())),
    }
}

/// Small two-wing floor used by the team brains and the spread timeline.
pub fn demo_floor() -> Vec<Room> {
    vec![
        Room::new("Lobby")
            .with_adjacent(["Hallway A", "Stairwell A"])
            .exterior(),
        Room::new("Hallway A").with_adjacent(["Lobby", "Room 101", "Room 102", "Hallway B"]),
        Room::new("Room 101").with_adjacent(["Hallway A"]),
        Room::new("Room 102").with_adjacent(["Hallway A"]),
        Room::new("Hallway B").with_adjacent(["Hallway A", "Room 201", "Room 202", "Stairwell A"]),
        Room::new("Room 201").with_adjacent(["Hallway B"]),
        Room::new("Room 202").with_adjacent(["Hallway B"]),
        Room::new("Stairwell A")
            .with_adjacent(["Lobby", "Hallway B", "Floor 2 Landing"])
            .stairwell(),
        Room::new("Floor 2 Landing")
            .with_adjacent(["Stairwell A", "Hallway C"])
            .stairwell(),
        Room::new("Hallway C").with_adjacent(["Floor 2 Landing", "Room 301", "Room 302"]),
        Room::new("Room 301").with_adjacent(["Hallway C"]),
        Room::new("Room 302").with_adjacent(["Hallway C"]),
    ]
}

fn fuel_for(room_type: &str) -> FuelLevel {
    match room_type {
        "office" | "lab" => FuelLevel::Medium,
        "lecture_hall" | "auditorium" => FuelLevel::High,
        _ => FuelLevel::Low,
    }
}

#[derive(Default)]
struct LayoutBuilder {
    rooms: Vec<Room>,
}

impl LayoutBuilder {
    fn add(&mut self, name: String, adjacent: Vec<String>, floor: u32, room_type: &str) -> &mut Room {
        self.rooms.push(
            Room::new(name)
                .with_adjacent(adjacent)
                .with_fuel(fuel_for(room_type))
                .on_floor(floor, room_type),
        );
        let last = self.rooms.len() - 1;
        &mut self.rooms[last]
    }

    fn office(&mut self, name: String, corridor: &str, floor: u32, room_type: &str) {
        self.add(name, vec![corridor.to_string()], floor, room_type);
    }

    /// Sorted, symmetric adjacency.
    fn finish(mut self) -> Vec<Room> {
        let mut links: HashMap<String, BTreeSet<String>> = self
            .rooms
            .iter()
            .map(|room| (room.name.clone(), room.adjacent.iter().cloned().collect()))
            .collect();
        for room in &self.rooms {
            for adj in &room.adjacent {
                if let Some(reverse) = links.get_mut(adj) {
                    reverse.insert(room.name.clone());
                }
            }
        }
        for room in &mut self.rooms {
            if let Some(adjacent) = links.remove(&room.name) {
                room.adjacent = adjacent.into_iter().collect();
            }
        }
        self.rooms
    }
}

/// Four-floor L-shaped academic building.
///
/// Corridor spine `C{f}100 .. C{f}500` per floor, a north-west and a central
/// stairwell linking floors, and three ground-floor exits (`Lobby`,
/// `West_Exit`, `East_Exit`).
pub fn siebel_center() -> Vec<Room> {
    let mut b = LayoutBuilder::default();

    for f in 1..=SIEBEL_FLOORS {
        let ground = f == 1;
        let c100 = format!("C{f}100");
        let c200 = format!("C{f}200");
        let c300 = format!("C{f}300");
        let c400 = format!("C{f}400");
        let c500 = format!("C{f}500");

        // West wing
        b.add(
            c100.clone(),
            vec![
                format!("Stairwell_NW_{f}"),
                format!("{f}111"),
                format!("{f}113"),
                format!("{f}109"),
                format!("{f}104"),
                c200.clone(),
            ],
            f,
            "corridor",
        );
        for office in ["111", "113", "109", "104"] {
            b.office(format!("{f}{office}"), &c100, f, "office");
        }

        let mut nw = vec![c100.clone(), format!("{f}124")];
        if f > 1 {
            nw.push(format!("Stairwell_NW_{}", f - 1));
        }
        if f < SIEBEL_FLOORS {
            nw.push(format!("Stairwell_NW_{}", f + 1));
        }
        let stair = b.add(format!("Stairwell_NW_{f}"), nw, f, "stairwell");
        stair.has_stairwell = true;
        stair.is_exterior = ground;
        b.office(format!("{f}124"), &format!("Stairwell_NW_{f}"), f, "office");

        // South wing
        let mut south = vec![
            c100.clone(),
            format!("{f}210"),
            format!("{f}214"),
            format!("{f}225"),
            format!("Elevator_{f}"),
            c300.clone(),
        ];
        if ground {
            south.push("West_Exit".to_string());
        }
        b.add(c200.clone(), south, f, "corridor");
        for office in ["210", "214", "225"] {
            b.office(format!("{f}{office}"), &c200, f, "office");
        }
        b.office(format!("Elevator_{f}"), &c200, f, "elevator");

        // Central section
        let mut central = vec![
            c200.clone(),
            format!("{f}302"),
            format!("{f}304"),
            format!("Stairwell_C_{f}"),
            c400.clone(),
        ];
        if ground {
            central.push("Lobby".to_string());
        }
        b.add(c300.clone(), central, f, "corridor");
        let hall = if ground { "lecture_hall" } else { "office" };
        b.office(format!("{f}302"), &c300, f, hall);
        b.office(format!("{f}304"), &c300, f, hall);

        let mut central_stair = vec![c300.clone()];
        if f > 1 {
            central_stair.push(format!("Stairwell_C_{}", f - 1));
        }
        if f < SIEBEL_FLOORS {
            central_stair.push(format!("Stairwell_C_{}", f + 1));
        }
        b.add(format!("Stairwell_C_{f}"), central_stair, f, "stairwell")
            .has_stairwell = true;

        // East angled section
        b.add(
            c400.clone(),
            vec![c300, format!("{f}403"), format!("{f}405"), c500.clone()],
            f,
            "corridor",
        );
        let east = if f <= 2 { "lecture_hall" } else { "lab" };
        b.office(format!("{f}403"), &c400, f, east);
        b.office(format!("{f}405"), &c400, f, east);

        // Far east wing
        let mut far_east = vec![c400, format!("{f}521"), format!("{f}532")];
        if ground {
            far_east.push("East_Exit".to_string());
            far_east.push("1500".to_string());
        }
        b.add(c500.clone(), far_east, f, "corridor");
        b.office(format!("{f}521"), &c500, f, "office");
        b.office(format!("{f}532"), &c500, f, "office");
    }

    b.add("Lobby".to_string(), vec!["C1300".to_string()], 1, "lobby")
        .is_exterior = true;
    b.add("West_Exit".to_string(), vec!["C1200".to_string()], 1, "exit")
        .is_exterior = true;
    b.add("East_Exit".to_string(), vec!["C1500".to_string()], 1, "exit")
        .is_exterior = true;
    b.office("1500".to_string(), "C1500", 1, "auditorium");

    b.finish()
}
