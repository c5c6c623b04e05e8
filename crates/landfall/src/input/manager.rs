use crate::session::Session;

use super::{Key, KeyEvent, KeyListener};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Owns the registered key listeners and fans key transitions out to them in
/// registration order, stopping at the first listener that consumes the
/// event.
#[derive(Default)]
pub struct EventManager {
    next_id: u64,
    listeners: Vec<(ListenerId, Box<dyn KeyListener>)>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_key_listener(&mut self, listener: Box<dyn KeyListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_key_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns whether any listener consumed the event.
    pub fn key_pressed(&mut self, key: Key, session: &mut Session) -> bool {
        let mut event = KeyEvent::new(key);
        for (_, listener) in &mut self.listeners {
            listener.key_pressed(&mut event, session);
            if event.is_consumed() {
                break;
            }
        }
        event.is_consumed()
    }

    pub fn key_released(&mut self, key: Key, session: &mut Session) -> bool {
        let mut event = KeyEvent::new(key);
        for (_, listener) in &mut self.listeners {
            listener.key_released(&mut event, session);
            if event.is_consumed() {
                break;
            }
        }
        event.is_consumed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::fixture::WorldSetup;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingListener {
        label: &'static str,
        consume: bool,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl KeyListener for RecordingListener {
        fn key_pressed(&mut self, event: &mut KeyEvent, _session: &mut Session) {
            self.log.borrow_mut().push(self.label);
            if self.consume {
                event.consume();
            }
        }

        fn key_released(&mut self, _event: &mut KeyEvent, _session: &mut Session) {
            self.log.borrow_mut().push(self.label);
        }
    }

    fn test_session() -> Session {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = SessionConfig {
            save_dir: dir.keep(),
            ..SessionConfig::default()
        };
        Session::new(config, &WorldSetup::dev_map(0))
    }

    #[test]
    fn dispatch_stops_at_first_consumer() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = EventManager::new();
        manager.add_key_listener(Box::new(RecordingListener {
            label: "first",
            consume: true,
            log: Rc::clone(&log),
        }));
        manager.add_key_listener(Box::new(RecordingListener {
            label: "second",
            consume: false,
            log: Rc::clone(&log),
        }));

        let mut session = test_session();
        assert!(manager.key_pressed(Key::T, &mut session));
        assert_eq!(*log.borrow(), vec!["first"]);
    }

    #[test]
    fn unconsumed_event_reaches_every_listener() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = EventManager::new();
        for label in ["first", "second"] {
            manager.add_key_listener(Box::new(RecordingListener {
                label,
                consume: false,
                log: Rc::clone(&log),
            }));
        }

        let mut session = test_session();
        assert!(!manager.key_pressed(Key::Escape, &mut session));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn removed_listener_gets_no_further_callbacks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = EventManager::new();
        let id = manager.add_key_listener(Box::new(RecordingListener {
            label: "only",
            consume: false,
            log: Rc::clone(&log),
        }));

        let mut session = test_session();
        manager.key_pressed(Key::T, &mut session);
        assert!(manager.remove_key_listener(id));
        assert!(!manager.remove_key_listener(id));
        manager.key_pressed(Key::T, &mut session);
        manager.key_released(Key::T, &mut session);

        assert_eq!(*log.borrow(), vec!["only"]);
        assert_eq!(manager.listener_count(), 0);
    }
}
