/*
 * Unit tests for elevator module
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_unit_delivers_single_rider
 * - test_unit_boards_waiting_rider_at_stop
 * - test_unit_stops_when_terminated
 * - test_unit_out_of_bounds_is_fatal
 * - test_unit_failed_unload_keeps_riders
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod fsm_tests {
    use std::sync::Arc;
    use std::thread::{sleep, spawn};
    use std::time::{Duration, Instant};

    use crossbeam_channel::{unbounded, Receiver, Sender};

    use crate::config::TimingConfig;
    use crate::coordinator::SimulationContext;
    use crate::elevator::{ElevatorHandle, ElevatorUnit};
    use crate::rider::Rider;
    use crate::shared::Behaviour::{Idle, OutOfService};
    use crate::shared::{BoardingState, ElevatorSnapshot, SimResult, SimulationError};

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            floor_travel_ms: 1,
            load_ms: 1,
            unload_ms: 1,
            dispatch_interval_ms: 1,
            idle_poll_ms: 1,
            shutdown_grace_ms: 1000,
        }
    }

    fn setup_unit(
        floors: i32,
    ) -> (
        Arc<SimulationContext>,
        Receiver<Arc<Rider>>,
        ElevatorHandle,
        Sender<()>,
        Receiver<SimResult<ElevatorSnapshot>>,
    ) {
        let (ctx, unassigned_rx) =
            SimulationContext::new(floors, fast_timing(), Duration::from_secs(10), Some(7));
        let handle = ElevatorHandle::new(0, 0);
        let (terminate_tx, terminate_rx) = unbounded::<()>();
        let (done_tx, done_rx) = unbounded::<SimResult<ElevatorSnapshot>>();

        let unit = ElevatorUnit::new(handle.clone(), ctx.clone(), terminate_rx);
        spawn(move || {
            let _ = done_tx.send(unit.run());
        });

        (ctx, unassigned_rx, handle, terminate_tx, done_rx)
    }

    fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            sleep(Duration::from_millis(2));
        }
        condition()
    }

    #[test]
    fn test_unit_delivers_single_rider() {
        // Purpose: Verify that an assigned rider is picked up and dropped off at its destination

        // Arrange
        let (ctx, _unassigned_rx, handle, terminate_tx, done_rx) = setup_unit(20);
        let rider = ctx.add_rider(5, 12).unwrap();

        // Act
        {
            let mut state = handle.lock();
            state.accept_request(rider.clone()).unwrap();
            state.apply_target(crate::shared::Direction::Up, 12);
        }
        let arrived = wait_until(Duration::from_secs(5), || rider.has_arrived());
        drop(terminate_tx);
        let result = done_rx.recv_timeout(Duration::from_secs(3)).unwrap();

        // Assert
        assert!(arrived);
        let snapshot = result.unwrap();
        assert_eq!(snapshot.current_floor, 12);
        assert_eq!(snapshot.total_transported, 1);
        assert_eq!(snapshot.behaviour, Idle);
        assert_eq!(snapshot.target_floor, None);
        assert_eq!(rider.state(), BoardingState::Arrived(0));
    }

    #[test]
    fn test_unit_boards_waiting_rider_at_stop() {
        // Purpose: Riders nobody was assigned to board when the doors open on their floor

        // Arrange
        let (ctx, _unassigned_rx, handle, terminate_tx, done_rx) = setup_unit(10);
        let assigned = ctx.add_rider(3, 8).unwrap();
        let waiting = ctx.add_rider(3, 6).unwrap();

        // Act
        handle.lock().accept_request(assigned.clone()).unwrap();
        let arrived = wait_until(Duration::from_secs(5), || {
            assigned.has_arrived() && waiting.has_arrived()
        });
        drop(terminate_tx);
        let snapshot = done_rx.recv_timeout(Duration::from_secs(3)).unwrap().unwrap();

        // Assert
        assert!(arrived);
        assert_eq!(waiting.state(), BoardingState::Arrived(0));
        assert_eq!(snapshot.total_transported, 2);
        assert_eq!(snapshot.current_floor, 8);
    }

    #[test]
    fn test_unit_stops_when_terminated() {
        // Purpose: An idle unit exits promptly once the coordinator hangs up

        // Arrange
        let (_ctx, _unassigned_rx, _handle, terminate_tx, done_rx) = setup_unit(5);

        // Act
        sleep(Duration::from_millis(20));
        drop(terminate_tx);
        let result = done_rx.recv_timeout(Duration::from_secs(1));

        // Assert
        let snapshot = result.unwrap().unwrap();
        assert_eq!(snapshot.current_floor, 0);
        assert_eq!(snapshot.total_transported, 0);
    }

    #[test]
    fn test_unit_out_of_bounds_is_fatal() {
        // Purpose: Moving outside [0, floors] stops the unit with an invariant violation

        // Arrange
        let (_ctx, _unassigned_rx, handle, _terminate_tx, done_rx) = setup_unit(3);

        // Act
        handle.lock().target_floor = Some(5);
        let result = done_rx.recv_timeout(Duration::from_secs(3)).unwrap();

        // Assert
        assert!(matches!(
            result,
            Err(SimulationError::InvariantViolation { elevator: 0, .. })
        ));
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.current_floor, 3);
        assert_eq!(snapshot.behaviour, OutOfService);
    }

    #[test]
    fn test_unit_failed_unload_keeps_riders() {
        // Purpose: When unloading fails, every rider that has not left yet stays in the car

        // Arrange
        let (_ctx, _unassigned_rx, handle, _terminate_tx, done_rx) = setup_unit(5);
        let stray = Arc::new(Rider::new(100, 1, 2).unwrap());
        let passenger = Arc::new(Rider::new(101, 1, 2).unwrap());
        stray.try_board(1, 1);
        passenger.try_board(0, 1);

        // Act
        {
            let mut state = handle.lock();
            state.aboard.push(stray.clone());
            state.aboard.push(passenger.clone());
        }
        let result = done_rx.recv_timeout(Duration::from_secs(3)).unwrap();

        // Assert
        assert!(matches!(
            result,
            Err(SimulationError::InvariantViolation { elevator: 0, .. })
        ));
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.current_floor, 2);
        assert_eq!(snapshot.riders_aboard, vec![100, 101]);
        assert_eq!(snapshot.total_transported, 0);
        assert_eq!(passenger.state(), BoardingState::Aboard(0));
    }
}
