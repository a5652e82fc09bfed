//! Length-prefixed message framing
//!
//! Every message on a reliable stream is `[u32 little-endian length][bincode payload]`.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::game::constants::net::MAX_MESSAGE_SIZE;

/// Errors that can occur during message framing
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Message too large: {0} bytes (max {1})")]
    MessageTooLarge(usize, usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read one raw frame
pub async fn read_frame<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Vec<u8>, FramingError> {
    let mut len_buf = [0u8; 4];
    read_exact_or_closed(stream, &mut len_buf).await?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge(len, MAX_MESSAGE_SIZE));
    }

    let mut buf = vec![0u8; len];
    if len > 0 {
        read_exact_or_closed(stream, &mut buf).await?;
    }
    Ok(buf)
}

/// Write one raw frame and flush
pub async fn write_frame<W: AsyncWrite + Unpin>(
    stream: &mut W,
    data: &[u8],
) -> Result<(), FramingError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge(data.len(), MAX_MESSAGE_SIZE));
    }

    stream.write_all(&(data.len() as u32).to_le_bytes()).await?;
    stream.write_all(data).await?;
    stream.flush().await?;
    Ok(())
}

async fn read_exact_or_closed<R: AsyncRead + Unpin>(
    stream: &mut R,
    buf: &mut [u8],
) -> Result<(), FramingError> {
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FramingError::ConnectionClosed),
        Err(e) => Err(FramingError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::systems::movement::{Direction, DirectionSet};
    use crate::net::protocol::{decode, encode, ClientMessage, ServerMessage};
    use std::io::Cursor;

    #[tokio::test]
    async fn test_message_round_trip_over_stream() {
        let messages = vec![
            ClientMessage::JoinRoom {
                room_id: "ABC123".to_string(),
                player_name: "Bob".to_string(),
            },
            ClientMessage::Move {
                directions: DirectionSet::single(Direction::Left),
            },
            ClientMessage::StartGame,
        ];

        let mut buffer = Vec::new();
        for msg in &messages {
            write_frame(&mut buffer, &encode(msg).unwrap()).await.unwrap();
        }

        let mut cursor = Cursor::new(buffer);
        for expected in &messages {
            let frame = read_frame(&mut cursor).await.unwrap();
            let got: ClientMessage = decode(&frame).unwrap();
            assert_eq!(&got, expected);
        }
        let end = read_frame(&mut cursor).await;
        assert!(matches!(end, Err(FramingError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_empty_frame() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"").await.unwrap();
        assert_eq!(buffer, vec![0, 0, 0, 0]);

        let mut cursor = Cursor::new(buffer);
        assert!(read_frame(&mut cursor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_frame_too_large() {
        let large = vec![0u8; MAX_MESSAGE_SIZE + 1];
        let mut buffer = Vec::new();
        let result = write_frame(&mut buffer, &large).await;
        assert!(matches!(result, Err(FramingError::MessageTooLarge(_, _))));

        let mut header = Cursor::new(((MAX_MESSAGE_SIZE + 1) as u32).to_le_bytes().to_vec());
        let result = read_frame(&mut header).await;
        assert!(matches!(result, Err(FramingError::MessageTooLarge(_, _))));
    }

    #[tokio::test]
    async fn test_read_truncated_payload() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&10u32.to_le_bytes());
        buffer.extend_from_slice(&[1, 2, 3]);

        let mut cursor = Cursor::new(buffer);
        let result = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(FramingError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_undecodable_frame_keeps_stream_aligned() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, &[0xEE; 8]).await.unwrap();
        write_frame(&mut buffer, &encode(&ServerMessage::NewRound).unwrap())
            .await
            .unwrap();

        let mut cursor = Cursor::new(buffer);
        let garbage = read_frame(&mut cursor).await.unwrap();
        assert!(decode::<ServerMessage>(&garbage).is_err());

        let next: ServerMessage = decode(&read_frame(&mut cursor).await.unwrap()).unwrap();
        assert_eq!(next, ServerMessage::NewRound);
    }
}
