/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/***************************************/
/*           Type aliases              */
/***************************************/
pub type ElevatorId = usize;
pub type RiderId = u64;
pub type Floor = i32;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Idle,
}

impl Direction {
    /// Direction of travel needed to get from `from` to `to`.
    pub fn toward(from: Floor, to: Floor) -> Direction {
        if to > from {
            Direction::Up
        } else if to < from {
            Direction::Down
        } else {
            Direction::Idle
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Idle => Direction::Idle,
        }
    }

    /// Signed floor step for one unit of travel.
    pub fn step(self) -> Floor {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
            Direction::Idle => 0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Idle => write!(f, "idle"),
        }
    }
}

/**
 * State of an elevator unit.
 *
 * - `Idle`:          No target and no riders.
 * - `Undirected`:    Holds riders (assigned or aboard) but has not resolved a direction yet.
 * - `MovingUp`:      Travelling towards a higher target floor.
 * - `MovingDown`:    Travelling towards a lower target floor.
 * - `AtFloor`:       Doors open, unloading and boarding riders.
 * - `OutOfService`:  The unit's task failed and it no longer accepts riders.
 */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "undirected")]
    Undirected,
    #[serde(rename = "movingUp")]
    MovingUp,
    #[serde(rename = "movingDown")]
    MovingDown,
    #[serde(rename = "atFloor")]
    AtFloor,
    #[serde(rename = "outOfService")]
    OutOfService,
}

impl Behaviour {
    pub fn moving(direction: Direction) -> Behaviour {
        match direction {
            Direction::Up => Behaviour::MovingUp,
            Direction::Down => Behaviour::MovingDown,
            Direction::Idle => Behaviour::Undirected,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoardingState {
    Waiting,
    Assigned(ElevatorId),
    Aboard(ElevatorId),
    Arrived(ElevatorId),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RiderSnapshot {
    pub id: RiderId,
    #[serde(rename = "startFloor")]
    pub start_floor: Floor,
    #[serde(rename = "destinationFloor")]
    pub destination_floor: Floor,
    pub state: BoardingState,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ElevatorSnapshot {
    pub id: ElevatorId,
    #[serde(rename = "currentFloor")]
    pub current_floor: Floor,
    pub direction: Direction,
    pub behaviour: Behaviour,
    #[serde(rename = "targetFloor")]
    pub target_floor: Option<Floor>,
    #[serde(rename = "totalTransported")]
    pub total_transported: u64,
    #[serde(rename = "ridersAboard")]
    pub riders_aboard: Vec<RiderId>,
    #[serde(rename = "ridersAssigned")]
    pub riders_assigned: Vec<RiderId>,
}
