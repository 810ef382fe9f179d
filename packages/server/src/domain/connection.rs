//! クライアント接続の状態遷移
//!
//! `Connecting → Connected → (Active ⇄ Idle) → Disconnected`
//!
//! Active / Idle はタイピング表示のためだけの区別で、どちらの状態でも
//! チャットメッセージは同じように受け付ける。Disconnected は終端。

/// 接続の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// ハンドシェイク中（クエリパラメータ検証前）
    Connecting,
    /// 参加完了直後
    Connected,
    /// タイピング中
    Active,
    /// タイピングしていない
    Idle,
    /// 切断済み（終端）
    Disconnected,
}

/// 状態遷移のきっかけ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    HandshakeAccepted,
    HandshakeRejected,
    Typing(bool),
    MessageSent,
    Closed,
}

impl ConnectionState {
    /// 次の状態を返す
    ///
    /// 意味を持たないイベントでは状態は変わらない。
    pub fn next(self, event: ConnectionEvent) -> ConnectionState {
        use ConnectionEvent as E;
        use ConnectionState as S;

        match (self, event) {
            (S::Disconnected, _) => S::Disconnected,
            (_, E::Closed) => S::Disconnected,
            (S::Connecting, E::HandshakeAccepted) => S::Connected,
            (S::Connecting, E::HandshakeRejected) => S::Disconnected,
            (S::Connecting, _) => S::Connecting,
            (_, E::Typing(true)) => S::Active,
            (_, E::Typing(false)) => S::Idle,
            // 送信した時点でタイピングは終わっている
            (S::Active, E::MessageSent) => S::Idle,
            (S::Connected, E::MessageSent) => S::Idle,
            (state, _) => state,
        }
    }

    /// チャットメッセージ・タイピングを受け付ける状態か
    pub fn accepts_events(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::Active | ConnectionState::Idle
        )
    }

    pub fn is_typing(self) -> bool {
        self == ConnectionState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_accepted_moves_to_connected() {
        // テスト項目: ハンドシェイク成功で Connected に遷移する
        // given (前提条件):
        let state = ConnectionState::Connecting;

        // when (操作):
        let next = state.next(ConnectionEvent::HandshakeAccepted);

        // then (期待する結果):
        assert_eq!(next, ConnectionState::Connected);
        assert!(next.accepts_events());
    }

    #[test]
    fn test_handshake_rejected_is_terminal() {
        // テスト項目: ハンドシェイク失敗で Disconnected に遷移し、以降は変化しない
        // given (前提条件):
        let state = ConnectionState::Connecting;

        // when (操作):
        let rejected = state.next(ConnectionEvent::HandshakeRejected);
        let after = rejected.next(ConnectionEvent::HandshakeAccepted);

        // then (期待する結果):
        assert_eq!(rejected, ConnectionState::Disconnected);
        assert_eq!(after, ConnectionState::Disconnected);
        assert!(!after.accepts_events());
    }

    #[test]
    fn test_typing_toggles_between_active_and_idle() {
        // テスト項目: タイピングイベントで Active と Idle を行き来する
        // given (前提条件):
        let state = ConnectionState::Connected;

        // when (操作):
        let active = state.next(ConnectionEvent::Typing(true));
        let idle = active.next(ConnectionEvent::Typing(false));
        let active_again = idle.next(ConnectionEvent::Typing(true));

        // then (期待する結果):
        assert_eq!(active, ConnectionState::Active);
        assert!(active.is_typing());
        assert_eq!(idle, ConnectionState::Idle);
        assert_eq!(active_again, ConnectionState::Active);
    }

    #[test]
    fn test_message_sent_while_typing_becomes_idle() {
        // テスト項目: タイピング中にメッセージを送ると Idle になる
        // given (前提条件):
        let state = ConnectionState::Active;

        // when (操作):
        let next = state.next(ConnectionEvent::MessageSent);

        // then (期待する結果):
        assert_eq!(next, ConnectionState::Idle);
    }

    #[test]
    fn test_close_from_any_live_state_disconnects() {
        // テスト項目: どの状態からでも Closed で Disconnected になる
        // given (前提条件):
        let states = [
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Active,
            ConnectionState::Idle,
        ];

        // when (操作) / then (期待する結果):
        for state in states {
            assert_eq!(
                state.next(ConnectionEvent::Closed),
                ConnectionState::Disconnected
            );
        }
    }

    #[test]
    fn test_events_before_handshake_are_ignored() {
        // テスト項目: ハンドシェイク前のタイピング・送信イベントは無視される
        // given (前提条件):
        let state = ConnectionState::Connecting;

        // when (操作):
        let after_typing = state.next(ConnectionEvent::Typing(true));
        let after_message = state.next(ConnectionEvent::MessageSent);

        // then (期待する結果):
        assert_eq!(after_typing, ConnectionState::Connecting);
        assert_eq!(after_message, ConnectionState::Connecting);
    }
}
