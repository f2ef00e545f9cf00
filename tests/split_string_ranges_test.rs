#[cfg(test)]
mod tests {
    use opencc_jieba_engine::OpenCC;

    fn pieces<'a>(text: &'a str, inclusive: bool, opencc: &OpenCC) -> Vec<&'a str> {
        opencc
            .split_string_ranges(text, inclusive)
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    #[test]
    fn test_split_inclusive() {
        let opencc = OpenCC::new().unwrap();
        // "你好，" (0..9), "世界！" (9..18)
        assert_eq!(opencc.split_string_ranges("你好，世界！", true), vec![0..9, 9..18]);

        assert_eq!(
            pieces("Hello,World!Rust.", true, &opencc),
            vec!["Hello,", "World!", "Rust."]
        );
        assert_eq!(pieces("黄河入海流", true, &opencc), vec!["黄河入海流"]);
        assert_eq!(pieces("，黄河", true, &opencc), vec!["，", "黄河"]);
        assert_eq!(
            pieces("「數大」便是美", true, &opencc),
            vec!["「", "數大」", "便是美"]
        );
    }

    #[test]
    fn test_split_exclusive() {
        let opencc = OpenCC::new().unwrap();
        // "你好" (0..6), "，" (6..9), "世界" (9..15), "！" (15..18)
        assert_eq!(
            opencc.split_string_ranges("你好，世界！", false),
            vec![0..6, 6..9, 9..15, 15..18]
        );
        assert_eq!(
            pieces("Hello,,World", false, &opencc),
            vec!["Hello", ",", ",", "World"]
        );
        assert_eq!(pieces(",,,", false, &opencc), vec![",", ",", ","]);
        assert_eq!(pieces("黄河。", false, &opencc), vec!["黄河", "。"]);
    }

    #[test]
    fn test_split_whitespace_and_fullwidth() {
        let opencc = OpenCC::new().unwrap();
        assert_eq!(
            pieces("白日\n依山　尽", true, &opencc),
            vec!["白日\n", "依山　", "尽"]
        );
        assert_eq!(pieces("a\r\nb", false, &opencc), vec!["a", "\r", "\n", "b"]);
    }

    #[test]
    fn test_split_covers_input() {
        let opencc = OpenCC::new().unwrap();
        assert!(opencc.split_string_ranges("", true).is_empty());
        assert!(opencc.split_string_ranges("", false).is_empty());

        let text = "“春眠不觉晓，处处闻啼鸟。” 夜来风雨声…花落知多少？";
        for inclusive in [true, false] {
            let ranges = opencc.split_string_ranges(text, inclusive);
            let mut next = 0;
            for range in &ranges {
                assert_eq!(range.start, next);
                assert!(range.end > range.start);
                next = range.end;
            }
            assert_eq!(next, text.len());
        }
    }
}
