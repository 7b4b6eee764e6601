//! Fish helper function templates.

use crate::helpers::HelperDef;

/// `__<prog>_query QUERY ARGS...` parses the tokens before the cursor and
/// answers one question about them:
///
/// - `path_is PATH...`: the selected subcommand path is one of `PATH`
/// - `positional_is N` / `positional_ge N`: the cursor is on positional `N`
///   (or later)
/// - `completing_option KEY...`: the cursor is on the argument of one of
///   the options
/// - `has_option KEY...`: one of the options was given
/// - `option_is KEY... -- VALUE...`: the last value of one of the options
///   is one of `VALUE`; an optional-argument option given without a value
///   counts as the empty value
pub static QUERY: HelperDef = HelperDef {
    name: "query",
    code: r#"function __@@_query
    set -l tokens (commandline -opc)
    set -e tokens[1]

    set -l path ''
    set -l positionals
    set -l having
    set -l keys
    set -l values
    set -l awaiting ''
    set -l end_of_options 0
    set -l reply

    for arg in $tokens
        if test -n "$awaiting"
            set -a having $awaiting
            set -a keys $awaiting
            set -a values $arg
            set awaiting ''
            continue
        end

        if test $end_of_options -eq 1; or not string match -qr -- '^-.' $arg
            set -a positionals $arg
#ifdef SUBCOMMANDS
            if set reply (__@@_resolve_subcommand "$path" (count $positionals) $arg)
                set path $reply
            end
#endif
            continue
        end

        if test "$arg" = --
            set end_of_options 1
            continue
        end

#ifdef LONG_OPTIONS
        if string match -qr -- '^--[^=]+=' $arg
            set -l parts (string split -m 1 -- = $arg)
            if set reply (__@@_lookup_option "$path" $parts[1]); and test $reply[2] != n
                set -a having $reply[1]
                set -a keys $reply[1]
                set -a values $parts[2]
                continue
            end
        end
#endif
#ifdef OLD_OPTIONS
        if string match -qr -- '^-[^-][^=]+=' $arg
            set -l parts (string split -m 1 -- = $arg)
            if set reply (__@@_lookup_option "$path" $parts[1]); and test $reply[2] != n
                set -a having $reply[1]
                set -a keys $reply[1]
                set -a values $parts[2]
                continue
            end
        end
#endif

        if set reply (__@@_lookup_option "$path" $arg)
            switch $reply[2]
                case r
                    set awaiting $reply[1]
                case o
                    set -a having $reply[1]
                    set -a keys $reply[1]
                    set -a values ''
                case '*'
                    set -a having $reply[1]
            end
            continue
        end

        string match -q -- '--*' $arg; and continue

#ifdef SHORT_OPTIONS
        set -l i 2
        set -l length (string length -- $arg)
        while test $i -le $length
            set -l char (string sub -s $i -l 1 -- $arg)
            set reply (__@@_lookup_option "$path" -$char); or break
            if test $reply[2] = n
                set -a having $reply[1]
#ifdef OPTION_STACKING
                set i (math $i + 1)
                continue
#else
                break
#endif
            end
            if test $i -lt $length
                set -a having $reply[1]
                set -a keys $reply[1]
                set -a values (string sub -s (math $i + 1) -- $arg)
            else if test $reply[2] = r
                set awaiting $reply[1]
            else
                set -a having $reply[1]
                set -a keys $reply[1]
                set -a values ''
            end
            break
        end
#endif
    end
#ifdef DEBUG

    printf '\n[%s] path=%s positionals=(%s) having=(%s) awaiting=%s\n' "$argv" "$path" "$positionals" "$having" "$awaiting" >&2
#endif

    set -l query $argv[1]
    set -e argv[1]
    switch $query
        case path_is
            contains -- "$path" $argv
        case completing_option
            test -n "$awaiting"; and contains -- $awaiting $argv
        case positional_is
            test -z "$awaiting"; and test (math (count $positionals) + 1) -eq $argv[1]
        case positional_ge
            test -z "$awaiting"; and test (math (count $positionals) + 1) -ge $argv[1]
        case has_option
            for key in $argv
                contains -- $key $having; and return 0
            end
            return 1
        case option_is
            set -l separator (contains -i -- -- $argv)
            set -l names $argv[1..(math $separator - 1)]
            set -l wanted $argv[(math $separator + 1)..-1]
            for name in $names
                set -l n (count $keys)
                while test $n -ge 1
                    if test "$keys[$n]" = "$name"
                        contains -- "$values[$n]" $wanted; and return 0
                        break
                    end
                    set n (math $n - 1)
                end
            end
            return 1
        case '*'
            return 1
    end
end"#,
    deps: &[],
};

/// The word being completed, without a leading `--option=`.
pub static TOKEN: HelperDef = HelperDef {
    name: "token",
    code: r#"function __@@_token
    set -l token (commandline -ct)
    if string match -qr -- '^-[^=]+=' $token
        string replace -r -- '^-[^=]+=' '' $token
    else
        printf '%s\n' $token
    end
end"#,
    deps: &[],
};

pub static SIGNALS: HelperDef = HelperDef {
    name: "signals",
    code: r#"function __@@_signals
    for signal in (string split -n ' ' -- (command kill -l 2>/dev/null | string join ' '))
        string match -qr -- '^\d+$' $signal; and continue
        string replace -r -- '^SIG' '' $signal
    end
end"#,
    deps: &[],
};

pub static SERVICES: HelperDef = HelperDef {
    name: "services",
    code: r#"function __@@_services
    if type -q systemctl
        systemctl list-unit-files --type=service --no-legend --no-pager 2>/dev/null | string replace -r -- '\.service\s.*$' ''
    else if test -d /etc/init.d
        string replace -r -- '^.*/' '' /etc/init.d/*
    end
end"#,
    deps: &[],
};

pub static LOGIN_SHELLS: HelperDef = HelperDef {
    name: "login_shells",
    code: r#"function __@@_login_shells
    string match -rv -- '^\s*(#|$)' < /etc/shells
end"#,
    deps: &[],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::HelperRegistry;

    #[test]
    fn test_optional_argument_without_value_resets_value() {
        let mut registry = HelperRegistry::new("example");
        registry.use_helper_with(&QUERY, "SHORT_OPTIONS");
        let code = registry.render().unwrap();
        assert!(code.contains(
            "                case o\n                    set -a having $reply[1]\n                    set -a keys $reply[1]\n                    set -a values ''\n"
        ));
        assert!(code.contains(
            "            else\n                set -a having $reply[1]\n                set -a keys $reply[1]\n                set -a values ''\n            end\n            break"
        ));
    }
}
