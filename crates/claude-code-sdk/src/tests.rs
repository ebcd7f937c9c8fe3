/// Decoding tests using representative stream-json payloads from the
/// `claude` CLI, plus wire-form round trips for each message kind.
#[cfg(test)]
mod unit {
    use crate::types::{ContentBlock, Message, RawMessage};
    use crate::{decode_message, parse_content_block};

    fn parse(json: &str) -> Message {
        let raw = RawMessage::new(json).expect("line is not JSON");
        decode_message(&raw).expect("failed to decode message")
    }

    fn round_trip(msg: &Message) -> Message {
        parse(&serde_json::to_string(msg).unwrap())
    }

    #[test]
    fn parse_system_init() {
        let json = r#"{
            "type": "system",
            "subtype": "init",
            "session_id": "abc-123",
            "data": {
                "model": "claude-sonnet-4-6",
                "tools": ["Read", "Bash", "Edit"],
                "cwd": "/tmp"
            }
        }"#;
        let Message::System(sys) = parse(json) else {
            panic!("expected System")
        };
        assert_eq!(sys.subtype, "init");
        assert_eq!(sys.session_id.as_deref(), Some("abc-123"));
        let data = sys.data.unwrap();
        assert_eq!(data["tools"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn parse_result_success() {
        let json = r#"{
            "type": "result",
            "subtype": "success",
            "session_id": "abc-123",
            "result": "Done!",
            "duration_ms": 5000,
            "is_error": false,
            "num_turns": 3,
            "total_cost_usd": 0.0042,
            "usage": {"input_tokens": 1200, "output_tokens": 400}
        }"#;
        let Message::Result(result) = parse(json) else {
            panic!("expected Result")
        };
        assert!(!result.is_error);
        assert_eq!(result.session_id(), Some("abc-123"));
        assert_eq!(result.text(), "Done!");
        assert_eq!(result.num_turns, Some(3));
        assert_eq!(result.usage.as_ref().unwrap().input_tokens, 1200);
        assert!((result.total_cost().unwrap() - 0.0042).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_result_with_cost_breakdown() {
        let json = r#"{
            "type": "result",
            "content": "Done",
            "cost": {
                "input_cached": 10, "input_uncached": 20, "output": 5,
                "input_cached_cost": 0.001, "input_uncached_cost": 0.002,
                "output_cost": 0.003, "total_cost": 0.006
            },
            "session": {"id": "sess-1", "context_window": 200000}
        }"#;
        let Message::Result(result) = parse(json) else {
            panic!("expected Result")
        };
        assert_eq!(result.text(), "Done");
        assert_eq!(result.total_cost(), Some(0.006));
        assert_eq!(result.session_id(), Some("sess-1"));
        assert!(result.cost.unwrap().customization_cost.is_none());
    }

    #[test]
    fn parse_result_error_max_turns() {
        let json = r#"{
            "type": "result",
            "subtype": "error_max_turns",
            "session_id": "abc-123",
            "is_error": true,
            "num_turns": 10,
            "total_cost_usd": 0.02
        }"#;
        let Message::Result(result) = parse(json) else {
            panic!("expected Result")
        };
        assert!(result.is_error);
        assert_eq!(result.subtype.as_deref(), Some("error_max_turns"));
        assert_eq!(result.text(), "");
    }

    #[test]
    fn parse_assistant_with_tool_use() {
        let json = r#"{
            "type": "assistant",
            "session_id": "abc-123",
            "message": {
                "id": "msg_abc",
                "role": "assistant",
                "model": "claude-sonnet-4-6",
                "content": [
                    {"type": "text", "text": "Let me read the file."},
                    {"type": "tool_use", "id": "tu_1", "name": "Read", "input": {"file_path": "/tmp/foo.txt"}}
                ]
            }
        }"#;
        let Message::Assistant(asst) = parse(json) else {
            panic!("expected Assistant")
        };
        let blocks: Vec<_> = asst.blocks().map(|b| b.unwrap()).collect();
        assert_eq!(blocks.len(), 2);
        let ContentBlock::ToolUse { name, input, .. } = &blocks[1] else {
            panic!("expected ToolUse")
        };
        assert_eq!(name, "Read");
        assert_eq!(input["file_path"], "/tmp/foo.txt");
    }

    #[test]
    fn tool_result_content_may_be_string_or_blocks() {
        let as_string = serde_json::json!({
            "type": "tool_result", "tool_use_id": "tu_1", "content": "file body"
        });
        let as_blocks = serde_json::json!({
            "type": "tool_result", "tool_use_id": "tu_1", "is_error": true,
            "content": [{"type": "text", "text": "permission denied"}]
        });

        let ContentBlock::ToolResult { content, .. } = parse_content_block(&as_string).unwrap()
        else {
            panic!("expected ToolResult")
        };
        assert_eq!(content.unwrap(), "file body");

        let ContentBlock::ToolResult {
            content, is_error, ..
        } = parse_content_block(&as_blocks).unwrap()
        else {
            panic!("expected ToolResult")
        };
        assert!(is_error);
        assert!(content.unwrap().is_array());
    }

    #[test]
    fn each_message_kind_survives_its_wire_form() {
        let lines = [
            r#"{"type":"user","content":"What is 2+2?"}"#,
            r#"{"type":"assistant","content":[{"type":"text","text":"4"},{"type":"tool_use","id":"t","name":"Bash","input":{"command":"ls"}},{"type":"tool_result","tool_use_id":"t","output":"ok","status_code":0}]}"#,
            r#"{"type":"system","subtype":"init","data":{"k":1}}"#,
            r#"{"type":"result","subtype":"success","result":"4","usage":{"input_tokens":1,"output_tokens":2,"total_tokens":3}}"#,
        ];
        for line in lines {
            let msg = parse(line);
            assert_eq!(round_trip(&msg), msg, "round trip changed {line}");
        }
    }

    #[test]
    fn each_content_block_kind_survives_its_wire_form() {
        let blocks = [
            ContentBlock::Text {
                text: "The answer is 4".into(),
            },
            ContentBlock::ToolUse {
                id: "tu_1".into(),
                name: "Bash".into(),
                input: serde_json::json!({"command": "ls -la", "timeout": 30}),
            },
            ContentBlock::ToolResult {
                tool_use_id: "tu_1".into(),
                content: Some(serde_json::json!([{"type": "text", "text": "total 0"}])),
                is_error: true,
                output: Some("total 0".into()),
                status_code: Some(2),
                warnings: vec!["truncated".into()],
                metadata: Some(serde_json::json!({"elapsed_ms": 12})),
            },
        ];
        for block in blocks {
            let value = serde_json::to_value(&block).unwrap();
            assert_eq!(value["type"], block.block_type());
            assert_eq!(parse_content_block(&value).unwrap(), block);
        }
    }

    #[test]
    fn serialized_message_carries_discriminator() {
        let msg = parse(r#"{"type":"user","content":"hi"}"#);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "user");
        assert_eq!(value["content"], "hi");
    }
}
