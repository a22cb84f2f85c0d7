/*
 * Unit tests for rider module
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_rider_rejects_same_floor_trip
 * - test_rider_assign_only_once
 * - test_rider_board_wrong_elevator
 * - test_rider_board_unassigned
 * - test_rider_arrive_wrong_floor
 * - test_rider_release
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod rider_tests {
    use crate::rider::Rider;
    use crate::shared::{AssignmentError, BoardingState, Direction, SimulationError};

    #[test]
    fn test_rider_rejects_same_floor_trip() {
        // Purpose: A trip must change floors

        // Act
        let result = Rider::new(1, 4, 4);

        // Assert
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_rider_assign_only_once() {
        // Purpose: Verify that a rider can only be assigned while waiting

        // Arrange
        let rider = Rider::new(1, 5, 12).unwrap();

        // Act
        let first = rider.try_assign(0);
        let second = rider.try_assign(1);

        // Assert
        assert_eq!(first, Ok(()));
        assert_eq!(
            second,
            Err(AssignmentError::AlreadyAssigned {
                rider: 1,
                state: BoardingState::Assigned(0),
            })
        );
        assert_eq!(rider.state(), BoardingState::Assigned(0));
        assert_eq!(rider.direction(), Direction::Up);
    }

    #[test]
    fn test_rider_board_wrong_elevator() {
        // Purpose: A rider assigned to one elevator must not board another one

        // Arrange
        let rider = Rider::new(1, 5, 2).unwrap();
        rider.try_assign(0).unwrap();

        // Act
        let boarded_other = rider.try_board(1, 5);
        let boarded_wrong_floor = rider.try_board(0, 6);
        let boarded = rider.try_board(0, 5);

        // Assert
        assert!(!boarded_other);
        assert!(!boarded_wrong_floor);
        assert!(boarded);
        assert_eq!(rider.state(), BoardingState::Aboard(0));
        assert_eq!(rider.pending_stop(), Some(2));
    }

    #[test]
    fn test_rider_board_unassigned() {
        // Purpose: A waiting rider may board whichever elevator opens its doors first

        // Arrange
        let rider = Rider::new(7, 3, 9).unwrap();

        // Act
        let boarded = rider.try_board(2, 3);
        let assign = rider.try_assign(0);

        // Assert
        assert!(boarded);
        assert!(assign.is_err());
        assert_eq!(rider.state(), BoardingState::Aboard(2));
    }

    #[test]
    fn test_rider_arrive_wrong_floor() {
        // Purpose: Unloading at a floor other than the destination is an invariant violation

        // Arrange
        let rider = Rider::new(1, 1, 8).unwrap();
        let not_aboard = rider.arrive(0, 8);
        rider.try_board(0, 1);

        // Act
        let wrong_floor = rider.arrive(0, 7);
        let right_floor = rider.arrive(0, 8);

        // Assert
        assert!(matches!(not_aboard, Err(SimulationError::InvariantViolation { .. })));
        assert!(matches!(wrong_floor, Err(SimulationError::InvariantViolation { .. })));
        assert!(right_floor.is_ok());
        assert!(rider.has_arrived());
        assert_eq!(rider.pending_stop(), None);
    }

    #[test]
    fn test_rider_release() {
        // Purpose: Only the elevator a rider is assigned to can release it

        // Arrange
        let rider = Rider::new(1, 10, 2).unwrap();
        rider.try_assign(3).unwrap();

        // Act
        let released_by_other = rider.release(1);
        let released = rider.release(3);

        // Assert
        assert!(!released_by_other);
        assert!(released);
        assert!(rider.is_waiting());
    }
}
