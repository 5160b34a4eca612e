//! Integration tests for properties, arrays and the built-in library

mod common;
use common::{run_js, run_js_string};
use ecmawalk::Value;
use pretty_assertions::assert_eq;

mod properties {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_put_get_round_trip() {
        assert_eq!(run_js_string("var o = {}; o.answer = 42; o.answer"), "42");
        assert_eq!(run_js_string("var o = {}; o['with space'] = 'x'; o['with space']"), "x");
    }

    #[test]
    fn test_insertion_order_and_enumerability() {
        let result = run_js("
            var o = { b: 1, a: 2 };
            o.c = 3;
            Object.defineProperty(o, 'hidden', { value: 4, enumerable: false });
            Object.keys(o).join() + '|' + Object.getOwnPropertyNames(o).join()
        ").unwrap();
        assert_eq!(result, Value::string("b,a,c|b,a,c,hidden"));
    }

    #[test]
    fn test_read_only_put_is_a_no_op() {
        let result = run_js("
            var o = {};
            Object.defineProperty(o, 'fixed', { value: 1, writable: false, configurable: false });
            o.fixed = 2;
            delete o.fixed;
            o.fixed
        ").unwrap();
        assert_eq!(result, Value::Number(1.0));
    }

    #[test]
    fn test_accessors() {
        let result = run_js("
            var o = {
                _v: 1,
                get v() { return this._v * 10; },
                set v(x) { this._v = x; }
            };
            o.v = 5;
            o.v
        ").unwrap();
        assert_eq!(result, Value::Number(50.0));
    }

    #[test]
    fn test_prototype_chain_lookup_and_shadowing() {
        let result = run_js("
            var base = { greet: 'hello', shared: 1 };
            var child = Object.create(base);
            child.shared = 2;
            child.greet + ':' + child.shared + ':' + base.shared + ':' + child.hasOwnProperty('greet')
        ").unwrap();
        assert_eq!(result, Value::string("hello:2:1:false"));
    }

    #[test]
    fn test_inherited_read_only_blocks_put() {
        let result = run_js("
            var proto = {};
            Object.defineProperty(proto, 'x', { value: 1, writable: false });
            var o = Object.create(proto);
            o.x = 2;
            o.x + ':' + o.hasOwnProperty('x')
        ").unwrap();
        assert_eq!(result, Value::string("1:false"));
    }

    #[test]
    fn test_freeze_seal_prevent_extensions() {
        let result = run_js("
            var f = Object.freeze({ a: 1 });
            f.a = 2; f.b = 3;
            var s = Object.seal({ a: 1 });
            s.a = 2; delete s.a;
            var p = Object.preventExtensions({});
            p.x = 1;
            [f.a, f.b, Object.isFrozen(f), s.a, Object.isSealed(s), Object.isExtensible(p), p.x].join()
        ").unwrap();
        assert_eq!(result, Value::string("1,,true,2,true,false,"));
    }

    #[test]
    fn test_property_descriptor_round_trip() {
        let result = run_js("
            var d = Object.getOwnPropertyDescriptor({ a: 1 }, 'a');
            [d.value, d.writable, d.enumerable, d.configurable].join()
        ").unwrap();
        assert_eq!(result, Value::string("1,true,true,true"));
    }

    #[test]
    fn test_object_to_string_tags() {
        assert_eq!(
            run_js_string("var t = Object.prototype.toString; [t.call([]), t.call(null), t.call(new Error('x')), t.call(JSON), t.call(Math)].join()"),
            "[object Array],[object Null],[object Error],[object JSON],[object Math]"
        );
    }
}

mod arrays {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_write_grows_length() {
        assert_eq!(run_js_string("var a = []; a[5] = 'x'; a.length"), "6");
    }

    #[test]
    fn test_invalid_length_is_range_error() {
        assert_eq!(run_js_string("try { [].length = 123.456; 'no' } catch (e) { e.name }"), "RangeError");
        assert_eq!(run_js_string("try { [].length = 0x100000000; 'no' } catch (e) { e.name }"), "RangeError");
        assert_eq!(run_js_string("var a = []; a.length = 0xFFFFFFFF; a.length"), "4294967295");
    }

    #[test]
    fn test_length_truncates() {
        assert_eq!(run_js_string("var a = [1, 2, 3, 4]; a.length = 2; a.join() + ':' + a[3]"), "1,2:undefined");
    }

    #[test]
    fn test_holes() {
        assert_eq!(run_js_string("var a = [1, , 3]; a.length + ':' + (1 in a)"), "3:false");
        assert_eq!(run_js_string("[, 'a', , 'b'].join('-')"), "-a--b");
    }

    #[test]
    fn test_mutators() {
        let result = run_js("
            var a = [3, 1, 2];
            a.push(4, 5);
            var popped = a.pop();
            var shifted = a.shift();
            a.unshift(0);
            a.reverse();
            [popped, shifted, a.join()].join('|')
        ").unwrap();
        assert_eq!(result, Value::string("5|3|4,2,1,0"));
    }

    #[test]
    fn test_splice_and_slice() {
        assert_eq!(run_js_string("var a = [1,2,3,4,5]; var r = a.splice(1, 2, 'x'); r.join() + '|' + a.join()"), "2,3|1,x,4,5");
        assert_eq!(run_js_string("[1,2,3,4].slice(-2).join()"), "3,4");
        assert_eq!(run_js_string("[1,2,3].concat([4,5], 6).join()"), "1,2,3,4,5,6");
    }

    #[test]
    fn test_sort() {
        assert_eq!(run_js_string("[10, 9, 1, 100].sort().join()"), "1,10,100,9");
        assert_eq!(run_js_string("[10, 9, 1, 100].sort(function (a, b) { return a - b; }).join()"), "1,9,10,100");
        assert_eq!(run_js_string("['b', undefined, 'a'].sort().join()"), "a,b,");
    }

    #[test]
    fn test_higher_order_methods() {
        assert_eq!(run_js_string("[1,2,3].map(function (x) { return x * x; }).join()"), "1,4,9");
        assert_eq!(run_js_string("[1,2,3,4].filter(function (x) { return x % 2; }).join()"), "1,3");
        assert_eq!(run_js_string("[1,2,3].reduce(function (a, b) { return a + b; })"), "6");
        assert_eq!(run_js_string("['a','b','c'].reduceRight(function (a, b) { return a + b; }, '')"), "cba");
        assert_eq!(run_js_string("[1,2].some(function (x) { return x > 1; }) + ',' + [1,2].every(function (x) { return x > 1; })"), "true,false");
        assert_eq!(run_js_string("try { [].reduce(function () {}); } catch (e) { e.name }"), "TypeError");
    }

    #[test]
    fn test_search() {
        assert_eq!(run_js_string("[1, 2, 1, NaN].indexOf(1) + ',' + [1, 2, 1].lastIndexOf(1) + ',' + [NaN].indexOf(NaN)"), "0,2,-1");
    }

    #[test]
    fn test_is_array() {
        assert_eq!(run_js_string("Array.isArray([]) + ',' + Array.isArray({ length: 0 })"), "true,false");
    }

    #[test]
    fn test_far_index_write() {
        assert_eq!(run_js_string("var a = []; a[4000000000] = 1; a.length"), "4000000001");
        assert_eq!(run_js_string("var a = []; a[4294967295] = 1; a.length + ':' + a[4294967295]"), "0:1");
    }

    #[test]
    fn test_sparse_iteration_visits_elements_only() {
        assert_eq!(
            run_js_string("
                var a = []; a[4000000000] = 'x'; a[7] = 'y';
                var seen = [];
                a.forEach(function (v, i) { seen.push(i + '=' + v); });
                seen.join()
            "),
            "7=y,4000000000=x"
        );
        assert_eq!(
            run_js_string("var a = []; a[3000000000] = 2; var m = a.map(function (x) { return x * 2; }); m.length + ':' + m[3000000000]"),
            "3000000001:4"
        );
        assert_eq!(
            run_js_string("
                var a = []; a[5] = 'b'; a[3000000000] = 'c';
                a.reduce(function (x, y) { return x + y; }, 'a') + a.reduceRight(function (x, y) { return x + y; })
            "),
            "abccb"
        );
        assert_eq!(run_js_string("var a = []; a[2000000000] = 1; a.filter(function () { return true; }).length"), "1");
    }

    #[test]
    fn test_sparse_copies() {
        assert_eq!(
            run_js_string("var a = []; a[3000000000] = 1; var c = [0].concat(a); c.length + ':' + c[3000000001]"),
            "3000000002:1"
        );
        assert_eq!(
            run_js_string("var a = []; a.length = 4294967295; try { a.concat([1]) } catch (e) { e.name }"),
            "RangeError"
        );
        assert_eq!(
            run_js_string("var a = []; a[3000000000] = 'z'; var s = a.slice(2999999999); s.length + ':' + s[1]"),
            "2:z"
        );
    }

    #[test]
    fn test_truncating_sparse_array() {
        assert_eq!(
            run_js_string("
                var a = []; a[10] = 1; a[3000000000] = 2; a[4000000000] = 3;
                a.length = 11;
                [a.length, a[10], 3000000000 in a, 4000000000 in a].join()
            "),
            "11,1,false,false"
        );
        assert_eq!(
            run_js_string("
                var a = []; a[1] = 1;
                Object.defineProperty(a, 3000000000, { value: 2, configurable: false });
                a[4000000000] = 3;
                a.length = 0;
                [a.length, a[1], a[3000000000], 4000000000 in a].join()
            "),
            "3000000001,1,2,false"
        );
    }

    #[test]
    fn test_join_of_huge_sparse_array_is_range_error() {
        assert_eq!(run_js_string("var a = []; a[4000000000] = 1; try { a.join() } catch (e) { e.name }"), "RangeError");
        assert_eq!(run_js_string("var a = []; a[4000000000] = 1; try { String(a) } catch (e) { e.name }"), "RangeError");
    }

    #[test]
    fn test_prototype_indices_fill_holes() {
        assert_eq!(
            run_js_string("
                Array.prototype[2] = 'p';
                var a = [0, , , 3];
                var r = a.join() + '|' + a.indexOf('p') + '|' + a.filter(function () { return true; }).length;
                delete Array.prototype[2];
                r
            "),
            "0,,p,3|2|3"
        );
        assert_eq!(
            run_js_string("Object.prototype[1] = 'o'; var r = [0, , 2].join(); delete Object.prototype[1]; r"),
            "0,o,2"
        );
    }
}

mod strings_numbers_math {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_methods() {
        assert_eq!(run_js_string("'Hello'.charAt(1) + 'Hello'.charCodeAt(0)"), "e72");
        assert_eq!(run_js_string("'a,b,,c'.split(',').length"), "4");
        assert_eq!(run_js_string("'  pad  '.trim() + '|'"), "pad|");
        assert_eq!(run_js_string("'abcdef'.substring(4, 1) + 'abcdef'.substr(-3, 2) + 'abcdef'.slice(-2)"), "bcddeef");
        assert_eq!(run_js_string("'aXbX'.replace('X', '-')"), "a-bX");
        assert_eq!(run_js_string("'Mixed'.toUpperCase() + 'Mixed'.toLowerCase()"), "MIXEDmixed");
        assert_eq!(run_js_string("String.fromCharCode(72, 105)"), "Hi");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(run_js_string("(255).toString(16) + ',' + (0.1 + 0.2) + ',' + (1e21) + ',' + (123.456).toFixed(1)"), "ff,0.30000000000000004,1e+21,123.5");
        assert_eq!(run_js_string("-0 + ''"), "0");
        assert_eq!(run_js_string("Number('  12  ') + Number('0x10')"), "28");
        assert_eq!(run_js_string("isNaN(Number('12px'))"), "true");
    }

    #[test]
    fn test_math() {
        assert_eq!(run_js_string("Math.max(1, 5, 3) + Math.min(4, 2) + Math.abs(-3) + Math.floor(2.7)"), "12");
        assert_eq!(run_js_string("Math.round(2.5) + ',' + Math.round(-2.5) + ',' + Math.pow(2, 10)"), "3,-2,1024");
    }

    #[test]
    fn test_wrappers() {
        assert_eq!(run_js_string("typeof new String('a') + ',' + typeof String(1) + ',' + new Number(5).valueOf()"), "object,string,5");
        assert_eq!(run_js_string("new Boolean(false) ? 'truthy' : 'falsy'"), "truthy");
    }

    #[test]
    fn test_function_prototype_methods() {
        assert_eq!(run_js_string("function f(a, b) { return this.k + a + b; } f.call({ k: 1 }, 2, 3)"), "6");
        assert_eq!(run_js_string("function f(a, b) { return this.k + a + b; } f.apply({ k: 1 }, [2, 3])"), "6");
        assert_eq!(run_js_string("function f(a, b) { return this.k + a + b; } var g = f.bind({ k: 1 }, 2); g(3) + ':' + g.length"), "6:1");
        assert_eq!(run_js_string("new Function('a', 'b', 'return a * b')(6, 7)"), "42");
    }
}
